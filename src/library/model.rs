use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque handle to a playable resource.
///
/// For the directory source this is the file path, but nothing outside the
/// source and the audio backend should rely on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the locator as a filesystem path.
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }
}

impl From<&Path> for Locator {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable descriptor of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub locator: Locator,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Milliseconds.
    pub duration_ms: u64,
    pub file_name: String,
    /// Milliseconds since the Unix epoch.
    pub date_added_ms: i64,
}

impl Track {
    /// Two descriptors refer to the same item when their locators match,
    /// even if metadata differs between scans.
    pub fn same_item(&self, other: &Track) -> bool {
        self.locator == other.locator
    }
}
