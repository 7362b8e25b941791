use crate::library::Locator;

use super::types::LoadToken;

/// The decode/output engine the playback coordinator drives.
///
/// `prepare` returns immediately; the outcome arrives later as a
/// [`super::PlayerEvent`] tagged with the same token, on whatever channel the
/// implementation hands to its owner.
pub trait MediaBackend {
    fn prepare(&mut self, token: LoadToken, locator: &Locator);
    fn start(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    /// Forget the loaded source entirely.
    fn reset(&mut self);
    fn seek(&mut self, position_ms: u64);
    fn position_ms(&self) -> u64;
    fn duration_ms(&self) -> Option<u64>;
}
