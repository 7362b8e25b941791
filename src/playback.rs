mod coordinator;
mod error;
mod playlist;
mod state;
mod ticker;
mod watch;

pub use coordinator::PlaybackCoordinator;
pub use error::PlaybackError;
pub use playlist::Playlist;
pub use state::{PlaybackState, PlaybackStatus};
pub use watch::{Subscription, SubscriptionId};

#[cfg(test)]
pub(crate) mod tests;
