use thiserror::Error;

use crate::library::Locator;

/// Failures the coordinator recovers from on its own. They are kept for
/// diagnostics and never leave the coordinator in an unusable state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("track index {index} is out of range for a playlist of {len}")]
    InvalidIndex { index: usize, len: usize },

    #[error("could not prepare {locator}: {reason}")]
    PrepareFailure { locator: Locator, reason: String },

    #[error("no track is loaded")]
    NoCurrentTrack,
}
