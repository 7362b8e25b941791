//! Playback state as seen by observers.

use crate::library::Track;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Nothing loaded.
    #[default]
    Idle,
    /// Waiting for the backend to finish loading `index`.
    Preparing { index: usize },
    Playing {
        index: usize,
        position_ms: u64,
        duration_ms: u64,
    },
    Paused {
        index: usize,
        position_ms: u64,
        duration_ms: u64,
    },
}

impl PlaybackStatus {
    pub fn index(&self) -> Option<usize> {
        match *self {
            PlaybackStatus::Idle => None,
            PlaybackStatus::Preparing { index }
            | PlaybackStatus::Playing { index, .. }
            | PlaybackStatus::Paused { index, .. } => Some(index),
        }
    }
}

/// Snapshot published to observers after every change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    /// The track at `status.index()`, if any.
    pub track: Option<Track>,
    pub shuffle: bool,
}

impl PlaybackState {
    pub fn current_index(&self) -> Option<usize> {
        self.status.index()
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.status, PlaybackStatus::Playing { .. })
    }

    pub fn position_ms(&self) -> u64 {
        match self.status {
            PlaybackStatus::Playing { position_ms, .. }
            | PlaybackStatus::Paused { position_ms, .. } => position_ms,
            _ => 0,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        match self.status {
            PlaybackStatus::Playing { duration_ms, .. }
            | PlaybackStatus::Paused { duration_ms, .. } => duration_ms,
            _ => 0,
        }
    }
}
