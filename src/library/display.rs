use std::time::Duration;

use super::model::Track;

pub const UNKNOWN_ARTIST: &str = "<Unknown>";

/// Title shown for a track: the tag title, or the file name when the tag is
/// missing or blank.
pub fn display_title(track: &Track) -> &str {
    match track.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => &track.file_name,
    }
}

pub fn display_artist(track: &Track) -> &str {
    match track.artist.as_deref().map(str::trim) {
        Some(a) if !a.is_empty() => a,
        _ => UNKNOWN_ARTIST,
    }
}

/// Format milliseconds as `MM:SS`.
pub fn format_mmss(ms: u64) -> String {
    let secs = Duration::from_millis(ms).as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
