//! The UI model: what the playlist view shows and where the cursor is.
//!
//! The catalog owns filtering and sorting; `App` layers the display order on
//! top (a random permutation while shuffle is on), tracks removed from the
//! view, the selection and the settings screen.

use std::borrow::Cow;
use std::collections::HashSet;

use rand::seq::SliceRandom;

use crate::library::{Catalog, Locator, Track};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Player,
    Settings,
}

/// Rows of the settings screen, top to bottom.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SettingsItem {
    SortOption,
    AutoScan,
    FilterShortTracks,
    Visualizer,
    AutoSaveState,
    Rescan,
}

impl SettingsItem {
    pub const ALL: [SettingsItem; 6] = [
        SettingsItem::SortOption,
        SettingsItem::AutoScan,
        SettingsItem::FilterShortTracks,
        SettingsItem::Visualizer,
        SettingsItem::AutoSaveState,
        SettingsItem::Rescan,
    ];

    /// Row label. The short-track row names the configured threshold.
    pub fn label(self, min_duration_ms: u64) -> Cow<'static, str> {
        match self {
            SettingsItem::SortOption => "Sort playlist by".into(),
            SettingsItem::AutoScan => "Scan library on startup".into(),
            SettingsItem::FilterShortTracks => {
                format!("Hide tracks under {}", threshold_text(min_duration_ms)).into()
            }
            SettingsItem::Visualizer => "Visualizer".into(),
            SettingsItem::AutoSaveState => "Remember last track".into(),
            SettingsItem::Rescan => "Rescan library now".into(),
        }
    }
}

fn threshold_text(ms: u64) -> String {
    match ms {
        60_000 => "a minute".to_string(),
        ms if ms >= 60_000 && ms % 60_000 == 0 => format!("{} minutes", ms / 60_000),
        ms if ms % 1_000 == 0 => format!("{}s", ms / 1_000),
        ms => format!("{ms}ms"),
    }
}

pub struct App {
    pub catalog: Catalog,
    /// Indices into `catalog.tracks()`, in display order.
    order: Vec<usize>,
    hidden: HashSet<Locator>,
    /// Row in the display order.
    pub selected: usize,
    pub screen: Screen,
    pub settings_cursor: usize,
    pub shuffle: bool,
    pub visualizer_enabled: bool,
    pub visualizer_frame: usize,
    pub notice: Option<String>,
    /// Locator of the coordinator's current track.
    pub now_playing: Option<Locator>,
    pub header_text: String,
}

impl App {
    pub fn new(catalog: Catalog, header_text: impl Into<String>) -> Self {
        let mut app = Self {
            catalog,
            order: Vec::new(),
            hidden: HashSet::new(),
            selected: 0,
            screen: Screen::default(),
            settings_cursor: 0,
            shuffle: false,
            visualizer_enabled: false,
            visualizer_frame: 0,
            notice: None,
            now_playing: None,
            header_text: header_text.into(),
        };
        app.rebuild_order();
        app
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tracks in display order.
    pub fn visible(&self) -> impl Iterator<Item = &Track> {
        let tracks = self.catalog.tracks();
        self.order.iter().filter_map(move |&i| tracks.get(i))
    }

    /// Owned copy of the display order, ready to become the playlist.
    pub fn visible_tracks(&self) -> Vec<Track> {
        self.visible().cloned().collect()
    }

    pub fn track_at(&self, row: usize) -> Option<&Track> {
        self.order
            .get(row)
            .and_then(|&i| self.catalog.tracks().get(i))
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.track_at(self.selected)
    }

    pub fn row_of(&self, locator: &Locator) -> Option<usize> {
        self.visible().position(|t| &t.locator == locator)
    }

    pub fn now_playing_row(&self) -> Option<usize> {
        self.now_playing.as_ref().and_then(|l| self.row_of(l))
    }

    /// Move the cursor to `locator` if it is visible.
    pub fn select_locator(&mut self, locator: &Locator) -> bool {
        match self.row_of(locator) {
            Some(row) => {
                self.selected = row;
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        if !self.is_empty() {
            self.selected = (self.selected + 1) % self.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.is_empty() {
            self.selected = (self.selected + self.len() - 1) % self.len();
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.len().saturating_sub(1);
    }

    /// Flip shuffle and reorder the view. The cursor stays on its track.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.refresh_view();
        self.shuffle
    }

    /// Recompute the display order after the catalog changed, keeping the
    /// cursor on the same track when it is still visible.
    pub fn refresh_view(&mut self) {
        let keep = self.selected_track().map(|t| t.locator.clone());
        self.rebuild_order();
        let found = keep.is_some_and(|l| self.select_locator(&l));
        if !found {
            self.selected = self.selected.min(self.len().saturating_sub(1));
        }
    }

    /// Forget tracks removed from the view, e.g. after a rescan.
    pub fn clear_hidden(&mut self) {
        self.hidden.clear();
    }

    /// Take the selected track out of the view until the next rescan.
    pub fn remove_selected(&mut self) -> Option<Track> {
        let track = self.selected_track()?.clone();
        self.hidden.insert(track.locator.clone());
        self.order.remove(self.selected);
        if self.selected >= self.len() {
            self.selected = self.len().saturating_sub(1);
        }
        Some(track)
    }

    pub fn settings_item(&self) -> SettingsItem {
        SettingsItem::ALL[self.settings_cursor % SettingsItem::ALL.len()]
    }

    pub fn settings_next(&mut self) {
        self.settings_cursor = (self.settings_cursor + 1) % SettingsItem::ALL.len();
    }

    pub fn settings_prev(&mut self) {
        let n = SettingsItem::ALL.len();
        self.settings_cursor = (self.settings_cursor + n - 1) % n;
    }

    pub fn toggle_settings_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Player => Screen::Settings,
            Screen::Settings => Screen::Player,
        };
    }

    pub fn set_notice(&mut self, msg: impl Into<String>) {
        self.notice = Some(msg.into());
    }

    /// Advance the visualizer animation. It only moves while playing.
    pub fn tick_visualizer(&mut self, playing: bool) {
        if self.visualizer_enabled && playing {
            self.visualizer_frame = self.visualizer_frame.wrapping_add(1);
        }
    }

    fn rebuild_order(&mut self) {
        let tracks = self.catalog.tracks();
        self.order = (0..tracks.len())
            .filter(|&i| !self.hidden.contains(&tracks[i].locator))
            .collect();
        if self.shuffle {
            self.order.shuffle(&mut rand::rng());
        }
    }
}
