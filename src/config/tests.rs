use super::load::{default_config_path, resolve_config_path, state_dir};
use super::schema::*;
use crate::library::SortOption;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_explicit_env_var() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("RETROAMP_CONFIG_PATH", "/tmp/retroamp-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/retroamp-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("retroamp")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("retroamp")
            .join("config.toml")
    );
}

#[test]
fn state_dir_falls_back_to_home_local_state() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_STATE_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        state_dir().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/state/retroamp")
    );

    let s = Settings::default();
    assert_eq!(
        s.preferences_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/state/retroamp/preferences.toml")
    );
}

#[test]
fn defaults_match_documented_values() {
    let s = Settings::default();
    assert_eq!(s.playback.poll_interval_ms, 500);
    assert_eq!(s.library.min_duration_ms, 60_000);
    assert_eq!(s.preferences.sort_option, SortOption::Alphabetical);
    assert!(s.preferences.auto_scan_on_startup);
    assert!(s.preferences.auto_save_state);
    assert!(!s.preferences.visualizer_enabled);
    assert!(!s.preferences.filter_short_tracks);
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_zero_intervals() {
    let mut s = Settings::default();
    s.playback.poll_interval_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.ui.visualizer_frame_ms = 0;
    assert!(s.validate().is_err());
}

#[test]
fn settings_load_from_config_file_and_parse_sort_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[library]
root = "/srv/music"
extensions = ["mp3"]
recursive = false
include_hidden = false
follow_links = false
min_duration_ms = 30000

[playback]
poll_interval_ms = 250
seek_step_seconds = 9

[ui]
header_text = "hello"
visualizer_frame_ms = 80

[preferences]
sort_option = "longest"
auto_scan_on_startup = false
filter_short_tracks = true
visualizer_enabled = true
auto_save_state = false
path = "/tmp/prefs.toml"

[logging]
filter = "warn"
directory = "/tmp/logs"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("RETROAMP_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("RETROAMP__PLAYBACK__POLL_INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.library.root.as_deref(), Some(std::path::Path::new("/srv/music")));
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(!s.library.recursive);
    assert!(!s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.library.min_duration_ms, 30_000);
    assert_eq!(s.playback.poll_interval_ms, 250);
    assert_eq!(s.playback.seek_step_seconds, 9);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.visualizer_frame_ms, 80);
    assert_eq!(s.preferences.sort_option, SortOption::DurationLongest);
    assert!(!s.preferences.auto_scan_on_startup);
    assert!(s.preferences.filter_short_tracks);
    assert!(s.preferences.visualizer_enabled);
    assert!(!s.preferences.auto_save_state);
    assert_eq!(
        s.preferences_path().unwrap(),
        std::path::PathBuf::from("/tmp/prefs.toml")
    );
    assert_eq!(s.logging.filter, "warn");
    assert_eq!(s.log_directory().unwrap(), std::path::PathBuf::from("/tmp/logs"));
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
poll_interval_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("RETROAMP_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("RETROAMP__PLAYBACK__POLL_INTERVAL_MS", "1000");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.poll_interval_ms, 1000);
}
