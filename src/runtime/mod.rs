use std::sync::mpsc;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::RodioBackend;
use crate::library::{Catalog, CatalogFilter, DirectorySource};
use crate::mpris::{self, ControlCmd};
use crate::playback::PlaybackCoordinator;

mod autosave;
mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_warning) = settings::load_settings();
    let log_dir = settings.log_directory();
    let _log_guard = logging::init(&settings.logging, log_dir.as_deref());
    info!(version = env!("CARGO_PKG_VERSION"), "starting");
    if let Some(msg) = settings_warning {
        warn!("{msg}");
    }

    let prefs = startup::open_preferences(&settings);
    let source = DirectorySource::new(startup::library_root(&settings), settings.library.clone());
    info!(root = %source.root().display(), "library root");

    let filter = CatalogFilter {
        filter_short_tracks: prefs.filter_short_tracks(),
        min_duration_ms: settings.library.min_duration_ms,
    };
    let mut app = App::new(
        Catalog::new(filter, prefs.sort_option()),
        settings.ui.header_text.clone(),
    );
    app.visualizer_enabled = prefs.visualizer_enabled();

    let (backend, player_events) = RodioBackend::spawn();
    let mut coordinator = PlaybackCoordinator::new(
        backend,
        Duration::from_millis(settings.playback.poll_interval_ms),
    );
    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    coordinator.attach_publisher(Box::new(mpris::spawn_mpris(control_tx)));
    let ui_state = coordinator.subscribe();

    if prefs.auto_scan_on_startup() {
        startup::rescan(&mut app, &source);
    } else {
        app.set_notice("Library not scanned; open settings (o) to rescan");
    }
    let resume = startup::restore_last_played(&mut app, &prefs);

    let mut event_loop = event_loop::EventLoop::new(
        &settings,
        app,
        prefs,
        coordinator,
        source,
        player_events,
        control_rx,
        ui_state,
    );
    event_loop.resume = resume;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
