use std::{env, path::PathBuf};

use super::schema::Settings;

const APP_DIR: &str = "retroamp";

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then environment variables
/// (prefix `RETROAMP__`), and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("RETROAMP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.playback.poll_interval_ms == 0 {
            return Err("playback.poll_interval_ms must be >= 1".to_string());
        }
        if self.ui.visualizer_frame_ms == 0 {
            return Err("ui.visualizer_frame_ms must be >= 1".to_string());
        }
        Ok(())
    }

    /// Preference file location: explicit setting, else the XDG state dir.
    pub fn preferences_path(&self) -> Option<PathBuf> {
        self.preferences
            .path
            .clone()
            .or_else(|| state_dir().map(|d| d.join("preferences.toml")))
    }

    /// Log directory: explicit setting, else the XDG state dir.
    pub fn log_directory(&self) -> Option<PathBuf> {
        self.logging
            .directory
            .clone()
            .or_else(|| state_dir().map(|d| d.join("logs")))
    }
}

/// Resolve the config path from `RETROAMP_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("RETROAMP_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/retroamp/config.toml`
/// or `~/.config/retroamp/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join(APP_DIR).join("config.toml"))
}

/// `$XDG_STATE_HOME/retroamp` or `~/.local/state/retroamp`.
pub fn state_dir() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join(APP_DIR))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
