//! When the last-played track reaches the preference file.
//!
//! Pausing and quitting remember the current track and its live position.
//! Stopping forgets it. Nothing is written while auto-save is off.

use crate::audio::MediaBackend;
use crate::playback::PlaybackCoordinator;
use crate::prefs::{Preferences, PrefsError};

pub fn on_pause<B: MediaBackend>(
    coordinator: &PlaybackCoordinator<B>,
    prefs: &mut Preferences,
) -> Result<(), PrefsError> {
    save_current(coordinator, prefs)
}

pub fn on_quit<B: MediaBackend>(
    coordinator: &PlaybackCoordinator<B>,
    prefs: &mut Preferences,
) -> Result<(), PrefsError> {
    save_current(coordinator, prefs)
}

pub fn on_stop(prefs: &mut Preferences) -> Result<(), PrefsError> {
    if !prefs.auto_save_state() {
        return Ok(());
    }
    prefs.save_playback_state(None)
}

fn save_current<B: MediaBackend>(
    coordinator: &PlaybackCoordinator<B>,
    prefs: &mut Preferences,
) -> Result<(), PrefsError> {
    if !prefs.auto_save_state() {
        return Ok(());
    }
    let Some(track) = coordinator.state().track.as_ref() else {
        return Ok(());
    };
    let position_ms = coordinator.live_position_ms();
    prefs.save_playback_state(Some((&track.locator, position_ms)))
}
