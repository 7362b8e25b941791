use super::*;
use crate::library::tests::track;
use crate::playback::{PlaybackState, PlaybackStatus};
use crate::session::{SessionStatus, describe};

fn playing(index: usize, position_ms: u64) -> SessionDescription {
    let mut t = track("test.mp3", Some("Test Title"), 1_234_000, 0);
    t.artist = Some("Test Artist".to_string());
    describe(&PlaybackState {
        status: PlaybackStatus::Playing {
            index,
            position_ms,
            duration_ms: 1_234_000,
        },
        track: Some(t),
        shuffle: false,
    })
}

fn handle() -> (MprisHandle, Receiver<Signal>) {
    let (notify, rx) = mpsc::channel();
    let handle = MprisHandle {
        state: Arc::new(Mutex::new(SharedState::default())),
        notify,
    };
    (handle, rx)
}

fn iface(state: Arc<Mutex<SharedState>>) -> (PlayerIface, Receiver<ControlCmd>) {
    let (tx, rx) = mpsc::channel();
    (PlayerIface { tx, state }, rx)
}

#[test]
fn position_only_updates_do_not_notify() {
    let (mut h, rx) = handle();
    h.publish(&playing(0, 0));
    assert_eq!(rx.try_iter().count(), 1);

    h.publish(&playing(0, 500));
    h.publish(&playing(0, 1_000));
    assert_eq!(rx.try_iter().count(), 0);
    let s = h.state.lock().unwrap();
    assert_eq!(s.current.as_ref().map(|d| d.position_ms), Some(1_000));
}

#[test]
fn status_or_track_change_notifies() {
    let (mut h, rx) = handle();
    h.publish(&playing(0, 0));
    h.publish(&describe(&PlaybackState::default()));
    h.publish(&playing(1, 0));
    assert_eq!(rx.try_iter().count(), 3);
}

#[test]
fn playback_status_follows_description() {
    let (h, _rx) = handle();
    let (player, _cmds) = iface(h.state.clone());
    assert_eq!(player.playback_status(), "Stopped");

    h.state.lock().unwrap().current = Some(playing(0, 0));
    assert_eq!(player.playback_status(), "Playing");
    assert!(player.can_pause());
    assert!(player.can_seek());

    let mut paused = playing(0, 0);
    paused.status = SessionStatus::Paused;
    h.state.lock().unwrap().current = Some(paused);
    assert_eq!(player.playback_status(), "Paused");
}

#[test]
fn metadata_has_expected_keys() {
    let map = metadata_map(&playing(7, 0));
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:url",
        "mpris:length",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }

    let idle = metadata_map(&describe(&PlaybackState::default()));
    assert!(!idle.contains_key("mpris:length"));
    assert!(!idle.contains_key("xesam:url"));
}

#[test]
fn track_path_uses_index_or_no_track() {
    assert_eq!(
        track_path(&playing(7, 0)).map(|p| p.as_str().to_string()),
        Some("/org/mpris/MediaPlayer2/track/7".to_string())
    );
    assert_eq!(
        track_path(&describe(&PlaybackState::default())).map(|p| p.as_str().to_string()),
        Some(NO_TRACK.to_string())
    );
}

#[test]
fn set_position_checks_track_id() {
    let (h, _rx) = handle();
    h.state.lock().unwrap().current = Some(playing(2, 0));
    let (player, cmds) = iface(h.state.clone());

    let stale = ObjectPath::try_from("/org/mpris/MediaPlayer2/track/1").unwrap();
    player.set_position(stale, 5_000_000);
    assert!(cmds.try_recv().is_err());

    let current = ObjectPath::try_from("/org/mpris/MediaPlayer2/track/2").unwrap();
    player.set_position(current, 5_000_000);
    assert_eq!(
        cmds.try_recv().ok(),
        Some(ControlCmd::SetPosition {
            position_us: 5_000_000
        })
    );
}

#[test]
fn transport_methods_become_commands() {
    let (h, _rx) = handle();
    let (player, cmds) = iface(h.state.clone());
    player.play_pause();
    player.next();
    player.previous();
    player.seek(-3_000_000);
    player.stop();
    let got: Vec<_> = cmds.try_iter().collect();
    assert_eq!(
        got,
        vec![
            ControlCmd::PlayPause,
            ControlCmd::Next,
            ControlCmd::Previous,
            ControlCmd::Seek {
                offset_us: -3_000_000
            },
            ControlCmd::Stop,
        ]
    );
}

#[test]
fn seek_sends_seeked_in_microseconds() {
    let (mut h, rx) = handle();
    h.publish(&playing(0, 0));
    h.seeked(42_000);
    h.publish(&playing(0, 42_000));
    let got: Vec<_> = rx.try_iter().collect();
    assert_eq!(
        got,
        vec![
            Signal::Changed,
            Signal::Seeked {
                position_us: 42_000_000
            },
        ]
    );
}
