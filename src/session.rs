//! What the desktop media-control surface should show for a playback state.
//!
//! `describe` is a pure mapping; `SessionPublisher` is whoever puts the
//! result on screen (MPRIS in production).

use crate::library::{Locator, display_title};
use crate::playback::{PlaybackState, PlaybackStatus};

pub const APP_NAME: &str = "retroamp";
pub const UNKNOWN_ARTIST: &str = "<Unknown Artist>";
pub const NO_TRACK_ARTIST: &str = "No track playing";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Playing,
    Paused,
    Stopped,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Playing => "Playing",
            SessionStatus::Paused => "Paused",
            SessionStatus::Stopped => "Stopped",
        }
    }
}

/// Transport controls the surface may offer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TransportActions {
    pub play: bool,
    pub pause: bool,
    pub play_pause: bool,
    pub next: bool,
    pub previous: bool,
    pub stop: bool,
    pub seek: bool,
}

impl TransportActions {
    fn with_track() -> Self {
        Self {
            play_pause: true,
            next: true,
            previous: true,
            stop: true,
            seek: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub title: String,
    pub artist: String,
    pub duration_ms: u64,
    pub position_ms: u64,
    pub status: SessionStatus,
    pub actions: TransportActions,
    /// Position in the playlist, used to build a stable track id.
    pub track_index: Option<usize>,
    pub locator: Option<Locator>,
}

pub fn describe(state: &PlaybackState) -> SessionDescription {
    let Some(track) = state.track.as_ref().filter(|_| state.current_index().is_some()) else {
        return SessionDescription {
            title: APP_NAME.to_string(),
            artist: NO_TRACK_ARTIST.to_string(),
            duration_ms: 0,
            position_ms: 0,
            status: SessionStatus::Stopped,
            actions: TransportActions {
                play: true,
                ..TransportActions::default()
            },
            track_index: None,
            locator: None,
        };
    };

    let (status, actions) = match state.status {
        PlaybackStatus::Playing { .. } => (
            SessionStatus::Playing,
            TransportActions {
                pause: true,
                ..TransportActions::with_track()
            },
        ),
        // A track that is still loading counts as paused.
        _ => (
            SessionStatus::Paused,
            TransportActions {
                play: true,
                ..TransportActions::with_track()
            },
        ),
    };

    let duration_ms = match state.duration_ms() {
        0 => track.duration_ms,
        d => d,
    };

    SessionDescription {
        title: display_title(track).to_string(),
        artist: track
            .artist
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(UNKNOWN_ARTIST)
            .to_string(),
        duration_ms,
        position_ms: state.position_ms(),
        status,
        actions,
        track_index: state.current_index(),
        locator: Some(track.locator.clone()),
    }
}

/// Receives a fresh description after every playback state change.
pub trait SessionPublisher {
    fn publish(&mut self, description: &SessionDescription);

    /// The position jumped because of a seek rather than normal playback.
    fn seeked(&mut self, _position_ms: u64) {}
}

#[cfg(test)]
mod tests;
