use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::Accessor;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::error::LibraryError;
use super::model::{Locator, Track};

/// Anything that can produce catalog rows.
///
/// Rows come back filtered to audio files and ordered by file name; any
/// further arrangement happens in [`super::arrange`].
pub trait TrackSource {
    fn query(&self) -> Result<Vec<Track>, LibraryError>;
}

/// Scans a directory tree for audio files.
pub struct DirectorySource {
    root: PathBuf,
    settings: LibrarySettings,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, settings: LibrarySettings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn date_added_ms(path: &Path) -> i64 {
    fs::metadata(path)
        .ok()
        .and_then(|m| m.created().or_else(|_| m.modified()).ok())
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn non_blank(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn read_track(path: &Path, locator: Locator) -> Track {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let mut title: Option<String> = None;
    let mut artist: Option<String> = None;
    let mut duration_ms: u64 = 0;

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            duration_ms = tagged.properties().duration().as_millis() as u64;
            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                title = non_blank(tag.title());
                artist = non_blank(tag.artist());
            }
        }
        Err(e) => debug!(path = %path.display(), error = %e, "no readable tags"),
    }

    Track {
        locator,
        title,
        artist,
        duration_ms,
        file_name,
        date_added_ms: date_added_ms(path),
    }
}

impl TrackSource for DirectorySource {
    fn query(&self) -> Result<Vec<Track>, LibraryError> {
        let settings = &self.settings;

        // Surface an unreadable or missing root instead of an empty catalog.
        fs::read_dir(&self.root).map_err(|e| LibraryError::from_io(self.root.clone(), e))?;

        let mut walker = WalkDir::new(&self.root).follow_links(settings.follow_links);

        // Non-recursive = only the root directory.
        let depth_cap = if settings.recursive {
            settings.max_depth
        } else {
            Some(1)
        };
        if let Some(d) = depth_cap {
            walker = walker.max_depth(d);
        }

        let mut seen: HashSet<Locator> = HashSet::new();
        let mut tracks: Vec<Track> = Vec::new();

        for entry in walker
            .into_iter()
            .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !is_audio_file(path, settings) {
                continue;
            }

            // Symlinked duplicates collapse onto one locator.
            let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            let locator = Locator::from(canonical.as_path());
            if !seen.insert(locator.clone()) {
                continue;
            }

            tracks.push(read_track(path, locator));
        }

        tracks.sort_by(|a, b| {
            a.file_name
                .to_lowercase()
                .cmp(&b.file_name.to_lowercase())
                .then_with(|| a.locator.cmp(&b.locator))
        });

        info!(root = %self.root.display(), count = tracks.len(), "scan finished");
        Ok(tracks)
    }
}
