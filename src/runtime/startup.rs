use std::env;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::app::App;
use crate::config::Settings;
use crate::library::{TrackSource, display_title};
use crate::prefs::{LastPlayed, PreferenceStore, Preferences};

/// Library root: first CLI argument, then `[library].root`, then the
/// working directory.
pub fn library_root(settings: &Settings) -> PathBuf {
    env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.library.root.clone())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Open the preference file. An unreadable file leaves the player running
/// on in-memory preferences for this session.
pub fn open_preferences(settings: &Settings) -> Preferences {
    let store = match settings.preferences_path() {
        Some(path) => match PreferenceStore::open(&path) {
            Ok(store) => {
                info!(path = %path.display(), "preferences opened");
                store
            }
            Err(e) => {
                warn!(error = %e, "preferences unreadable, not persisting this session");
                PreferenceStore::in_memory()
            }
        },
        None => {
            warn!("no state directory, preferences will not persist");
            PreferenceStore::in_memory()
        }
    };
    Preferences::new(store, settings.preferences.clone())
}

/// Rescan into the app. A failure keeps the current rows and shows why.
pub fn rescan(app: &mut App, source: &dyn TrackSource) {
    match app.catalog.rescan(source) {
        Ok(n) => {
            app.clear_hidden();
            app.refresh_view();
            app.set_notice(format!("{n} tracks in library"));
        }
        Err(e) => app.set_notice(format!("Scan failed: {e}")),
    }
}

/// Put the cursor on the last-played track. Returns it when found so the
/// caller can resume at the saved position.
pub fn restore_last_played(app: &mut App, prefs: &Preferences) -> Option<LastPlayed> {
    if !prefs.auto_save_state() {
        return None;
    }
    let last = prefs.load_playback_state()?;
    if !app.select_locator(&last.locator) {
        info!(locator = %last.locator, "last played track is no longer in the library");
        return None;
    }
    if let Some(t) = app.selected_track() {
        let msg = format!("Resume: {}", display_title(t));
        app.set_notice(msg);
    }
    Some(last)
}
