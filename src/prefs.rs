//! User preferences that survive restarts.
//!
//! `PreferenceStore` is the untyped grouped store; `Preferences` knows the
//! keys the player uses and the defaults that apply before anything was set.

mod error;
mod store;

pub use error::PrefsError;
pub use store::{PrefValue, PreferenceStore};

use crate::config::PreferenceDefaults;
use crate::library::{Locator, SortOption};

const PLAYLIST: &str = "playlist";
const SORT_OPTION: &str = "sort_option";
const AUTO_SCAN_ON_STARTUP: &str = "auto_scan_on_startup";
const FILTER_SHORT_TRACKS: &str = "filter_short_tracks";

const VISUALIZER: &str = "visualizer";
const ENABLED: &str = "enabled";

const PLAYER: &str = "player";
const AUTO_SAVE_STATE: &str = "auto_save_state";

const PLAYBACK_STATE: &str = "playback_state";
const LAST_TRACK_LOCATOR: &str = "last_track_locator";
const LAST_TRACK_POSITION_MS: &str = "last_track_position_ms";

/// The track that was current when state was last saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastPlayed {
    pub locator: Locator,
    pub position_ms: u64,
}

pub struct Preferences {
    store: PreferenceStore,
    defaults: PreferenceDefaults,
}

impl Preferences {
    pub fn new(store: PreferenceStore, defaults: PreferenceDefaults) -> Self {
        Self { store, defaults }
    }

    pub fn sort_option(&self) -> SortOption {
        let key = self
            .store
            .get_string(PLAYLIST, SORT_OPTION, self.defaults.sort_option.key());
        SortOption::from_key(&key).unwrap_or(self.defaults.sort_option)
    }

    pub fn set_sort_option(&mut self, sort: SortOption) -> Result<(), PrefsError> {
        self.store.set_string(PLAYLIST, SORT_OPTION, sort.key())
    }

    pub fn auto_scan_on_startup(&self) -> bool {
        self.store
            .get_bool(PLAYLIST, AUTO_SCAN_ON_STARTUP, self.defaults.auto_scan_on_startup)
    }

    pub fn set_auto_scan_on_startup(&mut self, on: bool) -> Result<(), PrefsError> {
        self.store.set_bool(PLAYLIST, AUTO_SCAN_ON_STARTUP, on)
    }

    pub fn filter_short_tracks(&self) -> bool {
        self.store
            .get_bool(PLAYLIST, FILTER_SHORT_TRACKS, self.defaults.filter_short_tracks)
    }

    pub fn set_filter_short_tracks(&mut self, on: bool) -> Result<(), PrefsError> {
        self.store.set_bool(PLAYLIST, FILTER_SHORT_TRACKS, on)
    }

    pub fn visualizer_enabled(&self) -> bool {
        self.store
            .get_bool(VISUALIZER, ENABLED, self.defaults.visualizer_enabled)
    }

    /// Flip the visualizer and return the new value.
    pub fn toggle_visualizer(&mut self) -> Result<bool, PrefsError> {
        let on = !self.visualizer_enabled();
        self.store.set_bool(VISUALIZER, ENABLED, on)?;
        Ok(on)
    }

    pub fn auto_save_state(&self) -> bool {
        self.store
            .get_bool(PLAYER, AUTO_SAVE_STATE, self.defaults.auto_save_state)
    }

    pub fn set_auto_save_state(&mut self, on: bool) -> Result<(), PrefsError> {
        self.store.set_bool(PLAYER, AUTO_SAVE_STATE, on)
    }

    /// Remember the current track and position, or forget it with `None`.
    pub fn save_playback_state(
        &mut self,
        current: Option<(&Locator, u64)>,
    ) -> Result<(), PrefsError> {
        match current {
            Some((locator, position_ms)) => {
                let position = i64::try_from(position_ms).unwrap_or(i64::MAX);
                self.store.set_many(
                    PLAYBACK_STATE,
                    [
                        (LAST_TRACK_LOCATOR, PrefValue::Text(locator.as_str().to_string())),
                        (LAST_TRACK_POSITION_MS, PrefValue::Int(position)),
                    ],
                )
            }
            None => self
                .store
                .remove_many(PLAYBACK_STATE, &[LAST_TRACK_LOCATOR, LAST_TRACK_POSITION_MS])
                .map(|_| ()),
        }
    }

    pub fn load_playback_state(&self) -> Option<LastPlayed> {
        let locator = self.store.get_string(PLAYBACK_STATE, LAST_TRACK_LOCATOR, "");
        if locator.is_empty() {
            return None;
        }
        let position_ms = self
            .store
            .get_int(PLAYBACK_STATE, LAST_TRACK_POSITION_MS, 0)
            .max(0) as u64;
        Some(LastPlayed {
            locator: Locator::new(locator),
            position_ms,
        })
    }
}
