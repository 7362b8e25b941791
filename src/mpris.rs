//! MPRIS session surface over D-Bus.
//!
//! The coordinator pushes `SessionDescription`s into `MprisHandle`; the
//! D-Bus thread reads them back when clients query properties and emits
//! `PropertiesChanged` whenever the handle signals a change, and `Seeked`
//! after a jump. Method calls from clients come back to the event loop as
//! `ControlCmd`s.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::session::{APP_NAME, SessionDescription, SessionPublisher};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";
const NOTIFY_POLL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Previous,
    /// Relative seek in microseconds.
    Seek { offset_us: i64 },
    /// Absolute position in microseconds, already checked against the
    /// current track id.
    SetPosition { position_us: i64 },
    Raise,
    Quit,
}

/// What the D-Bus thread should emit next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Signal {
    Changed,
    Seeked { position_us: i64 },
}

#[derive(Debug, Default)]
struct SharedState {
    current: Option<SessionDescription>,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<Signal>,
}

impl SessionPublisher for MprisHandle {
    fn publish(&mut self, description: &SessionDescription) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        let changed = s
            .current
            .as_ref()
            .is_none_or(|old| visible_change(old, description));
        s.current = Some(description.clone());
        drop(s);
        if changed {
            let _ = self.notify.send(Signal::Changed);
        }
    }

    fn seeked(&mut self, position_ms: u64) {
        let _ = self.notify.send(Signal::Seeked {
            position_us: position_ms as i64 * 1000,
        });
    }
}

/// Position moves on every tick and is read on demand by clients, so it
/// alone never triggers `PropertiesChanged`.
fn visible_change(old: &SessionDescription, new: &SessionDescription) -> bool {
    SessionDescription {
        position_ms: 0,
        ..old.clone()
    } != SessionDescription {
        position_ms: 0,
        ..new.clone()
    }
}

fn track_path(description: &SessionDescription) -> Option<OwnedObjectPath> {
    let raw = match description.track_index {
        Some(i) => format!("{OBJECT_PATH}/track/{i}"),
        None => NO_TRACK.to_string(),
    };
    ObjectPath::try_from(raw).ok().map(OwnedObjectPath::from)
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        let _ = self.tx.send(ControlCmd::Raise);
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        APP_NAME
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec!["audio/mpeg".to_string(), "audio/wav".to_string()]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn with_current<T>(&self, f: impl FnOnce(&SessionDescription) -> T) -> Option<T> {
        let s = self.state.lock().ok()?;
        s.current.as_ref().map(f)
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Previous);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::Seek { offset_us: offset });
    }

    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self.with_current(track_path).flatten();
        if current.as_ref().map(|p| p.as_str()) != Some(track_id.as_str()) {
            debug!(%track_id, "SetPosition for a track that is not current");
            return;
        }
        let _ = self.tx.send(ControlCmd::SetPosition {
            position_us: position,
        });
    }

    #[zbus(signal)]
    async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.with_current(|d| d.status.as_str())
            .unwrap_or("Stopped")
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        self.with_current(|d| d.position_ms as i64 * 1000)
            .unwrap_or(0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        self.with_current(|d| d.actions.play || d.actions.play_pause)
            .unwrap_or(true)
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        self.with_current(|d| d.actions.pause || d.actions.play_pause)
            .unwrap_or(false)
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        self.with_current(|d| d.actions.next).unwrap_or(false)
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        self.with_current(|d| d.actions.previous).unwrap_or(false)
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.with_current(|d| d.actions.seek).unwrap_or(false)
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        self.with_current(metadata_map).unwrap_or_default()
    }
}

fn metadata_map(d: &SessionDescription) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    let mut put = |key: &str, value: Option<OwnedValue>| {
        if let Some(v) = value {
            map.insert(key.to_string(), v);
        }
    };

    put(
        "mpris:trackid",
        track_path(d).and_then(|p| owned(Value::from(p.into_inner()))),
    );
    put("xesam:title", owned(Value::from(d.title.clone())));
    put("xesam:artist", owned(Value::from(vec![d.artist.clone()])));
    if d.duration_ms > 0 {
        put("mpris:length", owned(Value::from(d.duration_ms as i64 * 1000)));
    }
    if let Some(locator) = &d.locator {
        put(
            "xesam:url",
            owned(Value::from(format!("file://{}", locator.as_str()))),
        );
    }
    map
}

/// Start the D-Bus service on its own thread. Failure to reach the session
/// bus is logged and leaves the handle working as a sink.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<Signal>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(serve(tx, state_for_thread, notify_rx));
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<Signal>,
) {
    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "MPRIS: no session bus");
            return;
        }
    };

    let name = format!("org.mpris.MediaPlayer2.{APP_NAME}");
    if let Err(e) = connection.request_name(name.as_str()).await {
        warn!(error = %e, %name, "MPRIS: failed to acquire name");
        return;
    }

    let object_server = connection.object_server();
    if let Err(e) = object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await
    {
        warn!(error = %e, "MPRIS: failed to register root interface");
        return;
    }
    if let Err(e) = object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await
    {
        warn!(error = %e, "MPRIS: failed to register player interface");
        return;
    }

    let iface = match object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await
    {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "MPRIS: player interface lookup failed");
            return;
        }
    };
    debug!(%name, "MPRIS service registered");

    loop {
        Timer::after(NOTIFY_POLL).await;
        let mut dirty = false;
        let mut seeked = None;
        loop {
            match notify.try_recv() {
                Ok(Signal::Changed) => dirty = true,
                Ok(Signal::Seeked { position_us }) => seeked = Some(position_us),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }
        if let Some(position) = seeked {
            if let Err(e) = PlayerIface::seeked(iface.signal_emitter(), position).await {
                warn!(error = %e, "MPRIS: Seeked failed");
            }
        }
        if dirty {
            let player = iface.get().await;
            if let Err(e) = emit_changes(&player, iface.signal_emitter()).await {
                warn!(error = %e, "MPRIS: PropertiesChanged failed");
            }
        }
    }
}

async fn emit_changes(player: &PlayerIface, emitter: &SignalEmitter<'_>) -> zbus::Result<()> {
    player.playback_status_changed(emitter).await?;
    player.metadata_changed(emitter).await?;
    player.can_play_changed(emitter).await?;
    player.can_pause_changed(emitter).await?;
    player.can_go_next_changed(emitter).await?;
    player.can_go_previous_changed(emitter).await?;
    player.can_seek_changed(emitter).await?;
    Ok(())
}

#[cfg(test)]
mod tests;
