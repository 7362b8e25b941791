//! The ordered track list the coordinator plays from, plus the index
//! arithmetic that keeps a current position consistent across edits.

use crate::library::Track;

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn append(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn remove(&mut self, index: usize) -> Option<Track> {
        (index < self.tracks.len()).then(|| self.tracks.remove(index))
    }

    /// Move the track at `from` so it ends up at `to`. Returns false when
    /// either index is out of range.
    pub fn move_track(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tracks.len() || to >= self.tracks.len() {
            return false;
        }
        let t = self.tracks.remove(from);
        self.tracks.insert(to, t);
        true
    }

    /// Index after `current`, wrapping to 0. From no position, starts at 0.
    pub fn next_index(&self, current: Option<usize>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        Some(match current {
            Some(i) if i + 1 < self.len() => i + 1,
            _ => 0,
        })
    }

    /// Index before `current`, wrapping to the last track. From no position,
    /// starts at the last track.
    pub fn previous_index(&self, current: Option<usize>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        Some(match current {
            Some(i) if i > 0 && i <= self.len() => i - 1,
            _ => self.len() - 1,
        })
    }
}

/// Where `current` ends up after removing `removed`. `None` when the current
/// track itself was removed.
pub(crate) fn index_after_remove(current: usize, removed: usize) -> Option<usize> {
    use std::cmp::Ordering::*;
    match removed.cmp(&current) {
        Less => Some(current - 1),
        Equal => None,
        Greater => Some(current),
    }
}

/// Where `current` ends up after moving `from` to `to`.
pub(crate) fn index_after_move(current: usize, from: usize, to: usize) -> usize {
    if current == from {
        to
    } else if from < current && current <= to {
        current - 1
    } else if to <= current && current < from {
        current + 1
    } else {
        current
    }
}
