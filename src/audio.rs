//! Audio backend: the opaque media player the coordinator drives.
//!
//! `MediaBackend` is the seam; `RodioBackend` is the production
//! implementation that decodes and plays on its own thread and reports back
//! through `PlayerEvent`s.

mod backend;
mod player;
mod sink;
mod thread;
mod types;

pub use backend::MediaBackend;
pub use player::RodioBackend;
pub use types::{LoadToken, PlayerEvent};
