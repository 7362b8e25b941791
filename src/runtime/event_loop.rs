use std::io::Stdout;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info, warn};

use crate::app::{App, Screen, SettingsItem};
use crate::audio::{PlayerEvent, RodioBackend};
use crate::config::Settings;
use crate::library::{CatalogFilter, DirectorySource};
use crate::mpris::ControlCmd;
use crate::playback::{PlaybackCoordinator, PlaybackState, Subscription};
use crate::prefs::{LastPlayed, Preferences, PrefsError};
use crate::ui;

use super::{autosave, startup};

const INPUT_POLL: Duration = Duration::from_millis(50);

/// Everything the loop owns between iterations.
pub struct EventLoop<'a> {
    settings: &'a Settings,
    app: App,
    prefs: Preferences,
    coordinator: PlaybackCoordinator<RodioBackend>,
    source: DirectorySource,
    player_events: Receiver<PlayerEvent>,
    control_rx: Receiver<ControlCmd>,
    ui_state: Subscription<PlaybackState>,
    /// Saved position to apply when the restored track is played.
    pub resume: Option<LastPlayed>,
    playback: PlaybackState,
    pending_g: bool,
    last_frame: Instant,
}

impl<'a> EventLoop<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: &'a Settings,
        app: App,
        prefs: Preferences,
        coordinator: PlaybackCoordinator<RodioBackend>,
        source: DirectorySource,
        player_events: Receiver<PlayerEvent>,
        control_rx: Receiver<ControlCmd>,
        ui_state: Subscription<PlaybackState>,
    ) -> Self {
        Self {
            settings,
            app,
            prefs,
            coordinator,
            source,
            player_events,
            control_rx,
            ui_state,
            resume: None,
            playback: PlaybackState::default(),
            pending_g: false,
            last_frame: Instant::now(),
        }
    }

    /// Run until quit is requested, then save state.
    pub fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let frame_every = Duration::from_millis(self.settings.ui.visualizer_frame_ms);

        loop {
            while let Ok(ev) = self.player_events.try_recv() {
                self.coordinator.handle_event(ev);
            }

            let mut quit = false;
            while let Ok(cmd) = self.control_rx.try_recv() {
                if self.handle_control_cmd(cmd) {
                    quit = true;
                }
            }
            if quit {
                break;
            }

            let now = Instant::now();
            self.coordinator.poll_progress(now);
            if let Some(err) = self.coordinator.take_last_error() {
                self.app.set_notice(err.to_string());
            }

            if let Some(state) = self.ui_state.latest() {
                self.app.now_playing = state.track.as_ref().map(|t| t.locator.clone());
                self.playback = state;
            }

            if now.duration_since(self.last_frame) >= frame_every {
                self.app.tick_visualizer(self.playback.is_playing());
                self.last_frame = now;
            }

            terminal.draw(|f| {
                ui::draw(
                    f,
                    &self.app,
                    &self.playback,
                    &self.prefs,
                    &self.settings.ui,
                    self.settings.playback.seek_step_seconds,
                )
            })?;

            if event::poll(INPUT_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key_event(key) {
                        break;
                    }
                }
            }
        }

        info!("quitting");
        let res = autosave::on_quit(&self.coordinator, &mut self.prefs);
        self.report(res);
        self.coordinator.unsubscribe(self.ui_state.id());
        self.coordinator.stop();
        Ok(())
    }

    fn handle_control_cmd(&mut self, cmd: ControlCmd) -> bool {
        debug!(?cmd, "control command");
        match cmd {
            ControlCmd::Quit => return true,
            ControlCmd::Play => match self.coordinator.state().current_index() {
                None => self.play_selected(),
                Some(_) => self.coordinator.resume(),
            },
            ControlCmd::Pause => self.pause(),
            ControlCmd::PlayPause => self.play_pause(),
            ControlCmd::Stop => self.stop(),
            ControlCmd::Next => self.skip(true),
            ControlCmd::Previous => self.skip(false),
            ControlCmd::Seek { offset_us } => self.coordinator.seek_by(offset_us / 1000),
            ControlCmd::SetPosition { position_us } => {
                self.coordinator.seek(position_us.max(0) as u64 / 1000)
            }
            ControlCmd::Raise => self.app.screen = Screen::Player,
        }
        false
    }

    /// Returns true when the user asked to quit.
    fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        let was_g = std::mem::take(&mut self.pending_g);

        if key.code == KeyCode::Char('q') {
            return true;
        }

        if self.app.screen == Screen::Settings {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => self.app.settings_next(),
                KeyCode::Char('k') | KeyCode::Up => self.app.settings_prev(),
                KeyCode::Enter | KeyCode::Char(' ') => self.apply_setting(self.app.settings_item()),
                KeyCode::Char('o') | KeyCode::Esc => self.app.toggle_settings_screen(),
                _ => {}
            }
            return false;
        }

        let step_ms = (self.settings.playback.seek_step_seconds * 1000) as i64;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.app.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.app.select_prev(),
            KeyCode::Char('g') if was_g => self.app.select_first(),
            KeyCode::Char('g') => self.pending_g = true,
            KeyCode::Char('G') => self.app.select_last(),
            KeyCode::Enter => self.play_selected(),
            KeyCode::Char(' ') | KeyCode::Char('p') => self.play_pause(),
            KeyCode::Char('l') => self.skip(true),
            KeyCode::Char('h') => self.skip(false),
            KeyCode::Char('L') => self.coordinator.seek_by(step_ms),
            KeyCode::Char('H') => self.coordinator.seek_by(-step_ms),
            KeyCode::Char('x') => self.stop(),
            KeyCode::Char('s') => {
                let on = self.app.toggle_shuffle();
                if self.coordinator.shuffle() != on {
                    self.coordinator.toggle_shuffle();
                }
            }
            KeyCode::Char('v') => self.apply_setting(SettingsItem::Visualizer),
            KeyCode::Char('d') => self.remove_selected(),
            KeyCode::Char('o') => self.app.toggle_settings_screen(),
            _ => {}
        }
        false
    }

    /// Hand the visible order to the coordinator and play the cursor row.
    fn play_selected(&mut self) {
        let Some(locator) = self.app.selected_track().map(|t| t.locator.clone()) else {
            return;
        };
        self.coordinator.set_playlist(self.app.visible_tracks());
        self.coordinator.play_at(self.app.selected);

        if let Some(resume) = self.resume.take() {
            if resume.locator == locator {
                debug!(position_ms = resume.position_ms, "resuming saved position");
                self.coordinator.seek(resume.position_ms);
            }
        }
    }

    fn play_pause(&mut self) {
        if self.coordinator.state().current_index().is_none() {
            self.play_selected();
            return;
        }
        let was_playing = self.coordinator.state().is_playing();
        self.coordinator.toggle_play_pause();
        if was_playing {
            let res = autosave::on_pause(&self.coordinator, &mut self.prefs);
            self.report(res);
        }
    }

    fn pause(&mut self) {
        if self.coordinator.state().is_playing() {
            self.coordinator.pause();
            let res = autosave::on_pause(&self.coordinator, &mut self.prefs);
            self.report(res);
        }
    }

    fn stop(&mut self) {
        self.coordinator.stop();
        let res = autosave::on_stop(&mut self.prefs);
        self.report(res);
    }

    fn skip(&mut self, forward: bool) {
        if self.coordinator.playlist().is_empty() {
            self.play_selected();
        } else if forward {
            self.coordinator.next();
        } else {
            self.coordinator.previous();
        }
    }

    fn remove_selected(&mut self) {
        let Some(track) = self.app.remove_selected() else {
            return;
        };
        let index = self
            .coordinator
            .playlist()
            .tracks()
            .iter()
            .position(|t| t.same_item(&track));
        if let Some(i) = index {
            self.coordinator.remove(i);
        }
        self.app.set_notice(format!("Removed {}", track.file_name));
    }

    fn apply_setting(&mut self, item: SettingsItem) {
        let res = match item {
            SettingsItem::SortOption => {
                let next = self.prefs.sort_option().cycle();
                self.app.catalog.set_sort(next);
                self.app.refresh_view();
                self.prefs.set_sort_option(next)
            }
            SettingsItem::AutoScan => {
                let on = !self.prefs.auto_scan_on_startup();
                self.prefs.set_auto_scan_on_startup(on)
            }
            SettingsItem::FilterShortTracks => {
                let on = !self.prefs.filter_short_tracks();
                self.app.catalog.set_filter(CatalogFilter {
                    filter_short_tracks: on,
                    ..self.app.catalog.filter()
                });
                self.app.refresh_view();
                self.prefs.set_filter_short_tracks(on)
            }
            SettingsItem::Visualizer => self.prefs.toggle_visualizer().map(|on| {
                self.app.visualizer_enabled = on;
            }),
            SettingsItem::AutoSaveState => {
                let on = !self.prefs.auto_save_state();
                self.prefs.set_auto_save_state(on)
            }
            SettingsItem::Rescan => {
                startup::rescan(&mut self.app, &self.source);
                Ok(())
            }
        };
        self.report(res);
    }

    fn report(&mut self, res: Result<(), PrefsError>) {
        if let Err(e) = res {
            warn!(error = %e, "could not save preferences");
            self.app.set_notice(format!("Could not save preferences: {e}"));
        }
    }
}
