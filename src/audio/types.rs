//! Audio-related small types and handles.
//!
//! This module defines the load token, the events a backend reports back,
//! the commands understood by the audio thread and the shared clock used to
//! answer position queries without a round-trip to that thread.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::library::Locator;

/// Identifies one `prepare` request. Events carrying an older token belong
/// to a superseded load.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LoadToken(pub u64);

/// Asynchronous callbacks from a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The source is decoded and ready; playback has not started yet.
    Prepared {
        token: LoadToken,
        duration_ms: Option<u64>,
    },
    /// The source could not be opened or decoded.
    Failed { token: LoadToken, reason: String },
    /// The source played to its end.
    Completed { token: LoadToken },
}

impl PlayerEvent {
    pub fn token(&self) -> LoadToken {
        match self {
            PlayerEvent::Prepared { token, .. }
            | PlayerEvent::Failed { token, .. }
            | PlayerEvent::Completed { token } => *token,
        }
    }
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Open and decode `locator`, leaving it paused at zero.
    Load { token: LoadToken, locator: Locator },
    /// Start or resume the loaded source.
    Start,
    /// Pause the loaded source.
    Pause,
    /// Drop the loaded source.
    Stop,
    /// Jump to an absolute position in the loaded source.
    Seek(Duration),
    /// Quit the audio thread.
    Quit,
}

/// Elapsed-time bookkeeping for the loaded source.
#[derive(Debug, Clone, Default)]
pub struct BackendClock {
    accumulated: Duration,
    started_at: Option<Instant>,
    duration: Option<Duration>,
}

impl BackendClock {
    pub fn position_at(&self, now: Instant) -> Duration {
        let running = self
            .started_at
            .map_or(Duration::ZERO, |st| now.saturating_duration_since(st));
        self.accumulated + running
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn loaded(&mut self, duration: Option<Duration>) {
        *self = Self {
            duration,
            ..Self::default()
        };
    }

    pub fn resume(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += now.saturating_duration_since(st);
        }
    }

    /// Move to `position`, keeping the running/paused state.
    pub fn jump(&mut self, position: Duration, now: Instant) {
        self.accumulated = position;
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

pub type ClockHandle = Arc<Mutex<BackendClock>>;
