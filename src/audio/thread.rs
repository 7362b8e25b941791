use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use super::sink::create_sink_at;
use super::types::{AudioCmd, ClockHandle, LoadToken, PlayerEvent};

/// How often the thread checks for end-of-track while idle on the channel.
const COMPLETION_POLL: Duration = Duration::from_millis(200);

struct Loaded {
    token: LoadToken,
    path: PathBuf,
    sink: Sink,
    playing: bool,
}

struct AudioThread {
    stream: Option<OutputStream>,
    loaded: Option<Loaded>,
    clock: ClockHandle,
    events: Sender<PlayerEvent>,
}

impl AudioThread {
    fn with_clock(&self, f: impl FnOnce(&mut super::types::BackendClock)) {
        if let Ok(mut c) = self.clock.lock() {
            f(&mut c);
        }
    }

    fn emit(&self, event: PlayerEvent) {
        // The receiver only disappears during shutdown.
        let _ = self.events.send(event);
    }

    fn drop_loaded(&mut self) {
        if let Some(old) = self.loaded.take() {
            old.sink.stop();
        }
        self.with_clock(|c| c.clear());
    }

    fn load(&mut self, token: LoadToken, path: PathBuf) {
        self.drop_loaded();

        let Some(stream) = self.stream.as_ref() else {
            self.emit(PlayerEvent::Failed {
                token,
                reason: "no audio output device".to_string(),
            });
            return;
        };

        match create_sink_at(stream, &path, Duration::ZERO) {
            Ok((sink, total)) => {
                debug!(path = %path.display(), ?total, "source prepared");
                self.with_clock(|c| c.loaded(total));
                self.loaded = Some(Loaded {
                    token,
                    path,
                    sink,
                    playing: false,
                });
                self.emit(PlayerEvent::Prepared {
                    token,
                    duration_ms: total.map(|d| d.as_millis() as u64),
                });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to prepare source");
                self.emit(PlayerEvent::Failed {
                    token,
                    reason: e.to_string(),
                });
            }
        }
    }

    fn start(&mut self) {
        let now = Instant::now();
        if let Some(l) = self.loaded.as_mut() {
            l.sink.play();
            l.playing = true;
            self.with_clock(|c| c.resume(now));
        }
    }

    fn pause(&mut self) {
        let now = Instant::now();
        if let Some(l) = self.loaded.as_mut() {
            l.sink.pause();
            l.playing = false;
            self.with_clock(|c| c.pause(now));
        }
    }

    fn seek(&mut self, position: Duration) {
        let Some(stream) = self.stream.as_ref() else {
            return;
        };
        let Some(l) = self.loaded.as_mut() else {
            return;
        };

        // Rebuild the sink and skip into the file.
        match create_sink_at(stream, &l.path, position) {
            Ok((new_sink, _)) => {
                l.sink.stop();
                if l.playing {
                    new_sink.play();
                }
                l.sink = new_sink;
                let now = Instant::now();
                self.with_clock(|c| c.jump(position, now));
            }
            Err(e) => warn!(path = %l.path.display(), error = %e, "seek failed"),
        }
    }

    /// Report end-of-track once per load.
    fn check_completion(&mut self) {
        let finished = match self.loaded.as_mut() {
            Some(l) if l.playing && l.sink.empty() => {
                l.playing = false;
                Some(l.token)
            }
            _ => None,
        };
        if let Some(token) = finished {
            let now = Instant::now();
            self.with_clock(|c| c.pause(now));
            self.emit(PlayerEvent::Completed { token });
        }
    }
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    events: Sender<PlayerEvent>,
    clock: ClockHandle,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut s) => {
                // rodio logs to stderr when OutputStream is dropped, which
                // would scribble over the TUI.
                s.log_on_drop(false);
                Some(s)
            }
            Err(e) => {
                error!(error = %e, "no audio output device; every load will fail");
                None
            }
        };

        let mut audio = AudioThread {
            stream,
            loaded: None,
            clock,
            events,
        };

        loop {
            match rx.recv_timeout(COMPLETION_POLL) {
                Ok(cmd) => match cmd {
                    AudioCmd::Load { token, locator } => audio.load(token, locator.to_path()),
                    AudioCmd::Start => audio.start(),
                    AudioCmd::Pause => audio.pause(),
                    AudioCmd::Stop => audio.drop_loaded(),
                    AudioCmd::Seek(pos) => audio.seek(pos),
                    AudioCmd::Quit => {
                        audio.drop_loaded();
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => audio.check_completion(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("audio thread exiting");
    })
}
