//! The single authority for "what plays now".
//!
//! All methods run on the caller's thread. Loading is asynchronous: `play_at`
//! only asks the backend to prepare, and the transition to Playing happens
//! when the matching [`PlayerEvent::Prepared`] is fed back through
//! [`PlaybackCoordinator::handle_event`]. Every load gets a fresh
//! [`LoadToken`]; events carrying any other token are dropped, which is how a
//! stop or a newer `play_at` cancels a load still in flight.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::audio::{LoadToken, MediaBackend, PlayerEvent};
use crate::library::Track;
use crate::session::{SessionPublisher, describe};

use super::error::PlaybackError;
use super::playlist::{Playlist, index_after_move, index_after_remove};
use super::state::{PlaybackState, PlaybackStatus};
use super::ticker::ProgressTicker;
use super::watch::{StateWatch, Subscription, SubscriptionId};

pub struct PlaybackCoordinator<B: MediaBackend> {
    backend: B,
    playlist: Playlist,
    status: PlaybackStatus,
    shuffle: bool,
    issued: u64,
    active: Option<LoadToken>,
    pending_seek_ms: Option<u64>,
    /// Index of the last `play_at`, kept across stops.
    last_index: Option<usize>,
    ticker: ProgressTicker,
    last_error: Option<PlaybackError>,
    watch: StateWatch<PlaybackState>,
    publishers: Vec<Box<dyn SessionPublisher>>,
}

impl<B: MediaBackend> PlaybackCoordinator<B> {
    pub fn new(backend: B, poll_interval: Duration) -> Self {
        Self {
            backend,
            playlist: Playlist::default(),
            status: PlaybackStatus::Idle,
            shuffle: false,
            issued: 0,
            active: None,
            pending_seek_ms: None,
            last_index: None,
            ticker: ProgressTicker::new(poll_interval),
            last_error: None,
            watch: StateWatch::new(PlaybackState::default()),
            publishers: Vec::new(),
        }
    }

    /// Attach a session surface. It receives the current state right away.
    pub fn attach_publisher(&mut self, mut publisher: Box<dyn SessionPublisher>) {
        publisher.publish(&describe(self.watch.current()));
        self.publishers.push(publisher);
    }

    pub fn subscribe(&mut self) -> Subscription<PlaybackState> {
        self.watch.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.watch.unsubscribe(id)
    }

    pub fn state(&self) -> &PlaybackState {
        self.watch.current()
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    #[cfg(test)]
    pub fn ticker_armed(&self) -> bool {
        self.ticker.is_armed()
    }

    /// The last failure the coordinator recovered from, if not yet taken.
    pub fn take_last_error(&mut self) -> Option<PlaybackError> {
        self.last_error.take()
    }

    /// Position straight from the backend, between ticks.
    pub fn live_position_ms(&self) -> u64 {
        match self.status {
            PlaybackStatus::Playing { .. } => self.backend.position_ms(),
            _ => self.state().position_ms(),
        }
    }

    /// Replace the playlist. Whatever was loaded is dropped.
    pub fn set_playlist(&mut self, tracks: Vec<Track>) {
        info!(tracks = tracks.len(), "playlist replaced");
        self.playlist = Playlist::new(tracks);
        self.last_index = None;
        self.enter_idle();
        self.notify();
    }

    pub fn play_at(&mut self, index: usize) {
        let Some(track) = self.playlist.get(index) else {
            let len = self.playlist.len();
            warn!(index, len, "play_at with an invalid index");
            self.record(PlaybackError::InvalidIndex { index, len });
            self.enter_idle();
            self.notify();
            return;
        };
        let locator = track.locator.clone();

        self.issued += 1;
        let token = LoadToken(self.issued);
        self.active = Some(token);
        self.last_index = Some(index);
        self.pending_seek_ms = None;
        self.ticker.cancel();
        self.status = PlaybackStatus::Preparing { index };

        debug!(index, %locator, ?token, "preparing");
        self.backend.reset();
        self.backend.prepare(token, &locator);
        self.notify();
    }

    pub fn pause(&mut self) {
        match self.status {
            PlaybackStatus::Playing {
                index, duration_ms, ..
            } => {
                let position_ms = self.backend.position_ms();
                self.backend.pause();
                self.ticker.cancel();
                self.status = PlaybackStatus::Paused {
                    index,
                    position_ms,
                    duration_ms,
                };
                debug!(index, position_ms, "paused");
                self.notify();
            }
            PlaybackStatus::Idle => self.record(PlaybackError::NoCurrentTrack),
            PlaybackStatus::Paused { .. } | PlaybackStatus::Preparing { .. } => {}
        }
    }

    pub fn resume(&mut self) {
        match self.status {
            PlaybackStatus::Paused {
                index,
                position_ms,
                duration_ms,
            } => {
                self.backend.start();
                self.ticker.arm(Instant::now());
                self.status = PlaybackStatus::Playing {
                    index,
                    position_ms,
                    duration_ms,
                };
                debug!(index, position_ms, "resumed");
                self.notify();
            }
            PlaybackStatus::Idle => self.record(PlaybackError::NoCurrentTrack),
            PlaybackStatus::Playing { .. } | PlaybackStatus::Preparing { .. } => {}
        }
    }

    /// Pause when playing, resume when paused. When idle, replay the last
    /// selected index, or start from the top.
    pub fn toggle_play_pause(&mut self) {
        match self.status {
            PlaybackStatus::Playing { .. } => self.pause(),
            PlaybackStatus::Paused { .. } => self.resume(),
            PlaybackStatus::Idle if !self.playlist.is_empty() => {
                let index = self
                    .last_index
                    .filter(|i| *i < self.playlist.len())
                    .unwrap_or(0);
                self.play_at(index)
            }
            PlaybackStatus::Idle => self.record(PlaybackError::NoCurrentTrack),
            PlaybackStatus::Preparing { .. } => {}
        }
    }

    pub fn stop(&mut self) {
        debug!("stopped");
        self.backend.stop();
        self.enter_idle();
        self.notify();
    }

    pub fn next(&mut self) {
        match self.playlist.next_index(self.status.index()) {
            Some(i) => self.play_at(i),
            None => {
                debug!("next on an empty playlist");
                self.stop();
            }
        }
    }

    pub fn previous(&mut self) {
        match self.playlist.previous_index(self.status.index()) {
            Some(i) => self.play_at(i),
            None => {
                debug!("previous on an empty playlist");
                self.stop();
            }
        }
    }

    /// Jump to `position_ms`. While a track is still loading the position is
    /// applied once it is ready.
    pub fn seek(&mut self, position_ms: u64) {
        match self.status {
            PlaybackStatus::Playing {
                index, duration_ms, ..
            } => {
                self.backend.seek(position_ms);
                self.status = PlaybackStatus::Playing {
                    index,
                    position_ms,
                    duration_ms,
                };
                self.notify();
                self.announce_seek(position_ms);
            }
            PlaybackStatus::Paused {
                index, duration_ms, ..
            } => {
                self.backend.seek(position_ms);
                self.status = PlaybackStatus::Paused {
                    index,
                    position_ms,
                    duration_ms,
                };
                self.notify();
                self.announce_seek(position_ms);
            }
            PlaybackStatus::Preparing { .. } => self.pending_seek_ms = Some(position_ms),
            PlaybackStatus::Idle => self.record(PlaybackError::NoCurrentTrack),
        }
    }

    /// Seek relative to the live position, never before zero.
    pub fn seek_by(&mut self, delta_ms: i64) {
        let base = self.live_position_ms() as i64;
        self.seek(base.saturating_add(delta_ms).max(0) as u64);
    }

    /// Flip the shuffle flag. Reordering is up to whoever builds the playlist.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.notify();
        self.shuffle
    }

    pub fn append(&mut self, track: Track) {
        self.playlist.append(track);
    }

    /// Remove a playlist entry. Removing the current track stops playback.
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        let removed = self.playlist.remove(index)?;
        self.last_index = self.last_index.and_then(|l| index_after_remove(l, index));
        if let Some(current) = self.status.index() {
            match index_after_remove(current, index) {
                Some(new_index) => {
                    self.reindex(new_index);
                    self.notify();
                }
                None => self.stop(),
            }
        }
        Some(removed)
    }

    pub fn move_track(&mut self, from: usize, to: usize) -> bool {
        if !self.playlist.move_track(from, to) {
            return false;
        }
        self.last_index = self.last_index.map(|l| index_after_move(l, from, to));
        if let Some(current) = self.status.index() {
            self.reindex(index_after_move(current, from, to));
            self.notify();
        }
        true
    }

    pub fn handle_event(&mut self, event: PlayerEvent) {
        if self.active != Some(event.token()) {
            debug!(?event, "ignoring event for a superseded load");
            return;
        }

        match event {
            PlayerEvent::Prepared { duration_ms, .. } => {
                let PlaybackStatus::Preparing { index } = self.status else {
                    debug!(status = ?self.status, "prepared outside of Preparing");
                    return;
                };
                let fallback = self.playlist.get(index).map_or(0, |t| t.duration_ms);
                let duration_ms = duration_ms
                    .or_else(|| self.backend.duration_ms())
                    .filter(|d| *d > 0)
                    .unwrap_or(fallback);

                self.backend.start();
                let pending = self.pending_seek_ms.take();
                if let Some(p) = pending {
                    self.backend.seek(p);
                }
                let position_ms = pending.unwrap_or(0);
                self.ticker.arm(Instant::now());
                self.status = PlaybackStatus::Playing {
                    index,
                    position_ms,
                    duration_ms,
                };
                info!(index, duration_ms, "playing");
                self.notify();
                if let Some(p) = pending {
                    self.announce_seek(p);
                }
            }
            PlayerEvent::Failed { reason, .. } => {
                let locator = self
                    .status
                    .index()
                    .and_then(|i| self.playlist.get(i))
                    .map(|t| t.locator.clone());
                warn!(?locator, %reason, "track failed to prepare");
                if let Some(locator) = locator {
                    self.record(PlaybackError::PrepareFailure { locator, reason });
                }
                self.enter_idle();
                self.notify();
            }
            PlayerEvent::Completed { .. } => {
                if self.state().is_playing() {
                    debug!("track completed, advancing");
                    self.next();
                }
            }
        }
    }

    /// Refresh the position if the ticker is due. Returns true when a new
    /// state was published.
    pub fn poll_progress(&mut self, now: Instant) -> bool {
        if !self.ticker.fire_if_due(now) {
            return false;
        }
        let PlaybackStatus::Playing {
            index, duration_ms, ..
        } = self.status
        else {
            self.ticker.cancel();
            return false;
        };
        self.status = PlaybackStatus::Playing {
            index,
            position_ms: self.backend.position_ms(),
            duration_ms,
        };
        self.notify();
        true
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    fn enter_idle(&mut self) {
        self.backend.reset();
        self.active = None;
        self.pending_seek_ms = None;
        self.ticker.cancel();
        self.status = PlaybackStatus::Idle;
    }

    fn reindex(&mut self, new_index: usize) {
        self.status = match self.status {
            PlaybackStatus::Idle => PlaybackStatus::Idle,
            PlaybackStatus::Preparing { .. } => PlaybackStatus::Preparing { index: new_index },
            PlaybackStatus::Playing {
                position_ms,
                duration_ms,
                ..
            } => PlaybackStatus::Playing {
                index: new_index,
                position_ms,
                duration_ms,
            },
            PlaybackStatus::Paused {
                position_ms,
                duration_ms,
                ..
            } => PlaybackStatus::Paused {
                index: new_index,
                position_ms,
                duration_ms,
            },
        };
    }

    fn announce_seek(&mut self, position_ms: u64) {
        for p in self.publishers.iter_mut() {
            p.seeked(position_ms);
        }
    }

    fn record(&mut self, err: PlaybackError) {
        debug!(error = %err, "recovered");
        self.last_error = Some(err);
    }

    fn notify(&mut self) {
        let state = PlaybackState {
            status: self.status,
            track: self
                .status
                .index()
                .and_then(|i| self.playlist.get(i))
                .cloned(),
            shuffle: self.shuffle,
        };
        let description = describe(&state);
        for p in self.publishers.iter_mut() {
            p.publish(&description);
        }
        self.watch.publish(state);
    }
}
