use std::path::PathBuf;

use serde::Deserialize;

use crate::library::{DEFAULT_MIN_DURATION_MS, SortOption};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/retroamp/config.toml` or
/// `~/.config/retroamp/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `RETROAMP__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub ui: UiSettings,
    pub preferences: PreferenceDefaults,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory to scan when none is given on the command line.
    pub root: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
    /// Threshold for the "filter short tracks" preference (milliseconds).
    pub min_duration_ms: u64,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: None,
            extensions: vec!["mp3".into(), "wav".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
            min_duration_ms: DEFAULT_MIN_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// How often the position is refreshed while playing (milliseconds).
    pub poll_interval_ms: u64,
    /// Seconds to scrub when pressing `H` / `L`.
    pub seek_step_seconds: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            seek_step_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Time between visualizer frames (milliseconds).
    pub visualizer_frame_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ it really whips ~ ".to_string(),
            visualizer_frame_ms: 120,
        }
    }
}

/// Values the preference store falls back to on first run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreferenceDefaults {
    /// Where preferences are persisted. Defaults to
    /// `$XDG_STATE_HOME/retroamp/preferences.toml`.
    pub path: Option<PathBuf>,
    pub sort_option: SortOption,
    pub auto_scan_on_startup: bool,
    pub filter_short_tracks: bool,
    /// Whether the visualizer strip is shown before the user toggles it.
    pub visualizer_enabled: bool,
    pub auto_save_state: bool,
}

impl Default for PreferenceDefaults {
    fn default() -> Self {
        Self {
            path: None,
            sort_option: SortOption::Alphabetical,
            auto_scan_on_startup: true,
            filter_short_tracks: false,
            visualizer_enabled: false,
            auto_save_state: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    /// Directory for the rolling log file. Defaults to
    /// `$XDG_STATE_HOME/retroamp/logs`.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info,retroamp=debug".to_string(),
            directory: None,
        }
    }
}
