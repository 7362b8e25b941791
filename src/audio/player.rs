use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::library::Locator;

use super::backend::MediaBackend;
use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, BackendClock, ClockHandle, LoadToken, PlayerEvent};

/// `MediaBackend` backed by a rodio output stream on a dedicated thread.
pub struct RodioBackend {
    tx: Sender<AudioCmd>,
    clock: ClockHandle,
    join: Option<JoinHandle<()>>,
}

impl RodioBackend {
    /// Spawn the audio thread. The returned receiver yields the backend's
    /// events and is meant to be drained by the event loop.
    pub fn spawn() -> (Self, Receiver<PlayerEvent>) {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let (event_tx, event_rx) = mpsc::channel::<PlayerEvent>();
        let clock: ClockHandle = Arc::new(Mutex::new(BackendClock::default()));

        let join = spawn_audio_thread(rx, event_tx, clock.clone());

        (
            Self {
                tx,
                clock,
                join: Some(join),
            },
            event_rx,
        )
    }

    fn send(&self, cmd: AudioCmd) {
        if let Err(e) = self.tx.send(cmd) {
            warn!(cmd = ?e.0, "audio thread is gone");
        }
    }

    /// Stop the audio thread and wait for it to exit.
    pub fn shutdown(&mut self) {
        self.send(AudioCmd::Quit);
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.shutdown();
        }
    }
}

impl MediaBackend for RodioBackend {
    fn prepare(&mut self, token: LoadToken, locator: &Locator) {
        self.send(AudioCmd::Load {
            token,
            locator: locator.clone(),
        });
    }

    fn start(&mut self) {
        self.send(AudioCmd::Start);
    }

    fn pause(&mut self) {
        self.send(AudioCmd::Pause);
    }

    fn stop(&mut self) {
        self.send(AudioCmd::Stop);
    }

    fn reset(&mut self) {
        self.send(AudioCmd::Stop);
    }

    fn seek(&mut self, position_ms: u64) {
        self.send(AudioCmd::Seek(Duration::from_millis(position_ms)));
    }

    fn position_ms(&self) -> u64 {
        self.clock
            .lock()
            .map(|c| c.position_at(Instant::now()).as_millis() as u64)
            .unwrap_or(0)
    }

    fn duration_ms(&self) -> Option<u64> {
        self.clock
            .lock()
            .ok()
            .and_then(|c| c.duration())
            .map(|d| d.as_millis() as u64)
    }
}
