use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::*;
use crate::audio::{LoadToken, MediaBackend, PlayerEvent};
use crate::library::Locator;
use crate::library::tests::track;
use crate::session::{SessionDescription, SessionPublisher, SessionStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Prepare(LoadToken, Locator),
    Start,
    Pause,
    Stop,
    Reset,
    Seek(u64),
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    calls: Vec<Call>,
    last_token: Option<LoadToken>,
    position: Rc<Cell<u64>>,
}

impl MediaBackend for FakeBackend {
    fn prepare(&mut self, token: LoadToken, locator: &Locator) {
        self.last_token = Some(token);
        self.calls.push(Call::Prepare(token, locator.clone()));
    }
    fn start(&mut self) {
        self.calls.push(Call::Start);
    }
    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }
    fn stop(&mut self) {
        self.calls.push(Call::Stop);
    }
    fn reset(&mut self) {
        self.calls.push(Call::Reset);
    }
    fn seek(&mut self, position_ms: u64) {
        self.position.set(position_ms);
        self.calls.push(Call::Seek(position_ms));
    }
    fn position_ms(&self) -> u64 {
        self.position.get()
    }
    fn duration_ms(&self) -> Option<u64> {
        None
    }
}

const TICK: Duration = Duration::from_millis(500);

pub(crate) fn coordinator(n: usize) -> (PlaybackCoordinator<FakeBackend>, Rc<Cell<u64>>) {
    let backend = FakeBackend::default();
    let position = backend.position.clone();
    let mut c = PlaybackCoordinator::new(backend, TICK);
    let tracks = (0..n)
        .map(|i| track(&format!("{i:02}.mp3"), None, 120_000, 0))
        .collect();
    c.set_playlist(tracks);
    (c, position)
}

fn token(c: &PlaybackCoordinator<FakeBackend>) -> LoadToken {
    c.backend().last_token.expect("nothing prepared")
}

pub(crate) fn prepared(c: &mut PlaybackCoordinator<FakeBackend>) {
    let token = token(c);
    c.handle_event(PlayerEvent::Prepared {
        token,
        duration_ms: Some(120_000),
    });
}

#[test]
fn play_at_then_prepared_is_playing() {
    let (mut c, _) = coordinator(3);
    c.play_at(1);
    assert_eq!(c.state().status, PlaybackStatus::Preparing { index: 1 });
    assert_eq!(c.state().track.as_ref().map(|t| t.file_name.as_str()), Some("01.mp3"));

    prepared(&mut c);
    assert!(c.state().is_playing());
    assert_eq!(c.state().current_index(), Some(1));
    assert_eq!(c.state().duration_ms(), 120_000);
    assert!(c.backend().calls.contains(&Call::Start));
}

#[test]
fn out_of_range_index_goes_idle() {
    let (mut c, _) = coordinator(3);
    c.play_at(0);
    prepared(&mut c);

    c.play_at(3);
    assert_eq!(c.state().status, PlaybackStatus::Idle);
    assert!(c.state().track.is_none());
    assert_eq!(
        c.take_last_error(),
        Some(PlaybackError::InvalidIndex { index: 3, len: 3 })
    );
    assert_eq!(c.take_last_error(), None);
}

#[test]
fn next_wraps_to_first() {
    let (mut c, _) = coordinator(3);
    c.play_at(2);
    prepared(&mut c);
    c.next();
    assert_eq!(c.state().status, PlaybackStatus::Preparing { index: 0 });
}

#[test]
fn previous_wraps_to_last() {
    let (mut c, _) = coordinator(3);
    c.play_at(0);
    prepared(&mut c);
    c.previous();
    assert_eq!(c.state().status, PlaybackStatus::Preparing { index: 2 });
}

#[test]
fn navigation_from_idle() {
    let (mut c, _) = coordinator(3);
    c.next();
    assert_eq!(c.state().current_index(), Some(0));
    c.stop();
    c.previous();
    assert_eq!(c.state().current_index(), Some(2));
}

#[test]
fn empty_playlist_stays_idle() {
    let (mut c, _) = coordinator(0);
    c.next();
    assert_eq!(c.state().status, PlaybackStatus::Idle);
    c.previous();
    assert_eq!(c.state().status, PlaybackStatus::Idle);
    c.play_at(0);
    assert_eq!(c.state().status, PlaybackStatus::Idle);
    assert!(matches!(
        c.take_last_error(),
        Some(PlaybackError::InvalidIndex { index: 0, len: 0 })
    ));
}

#[test]
fn late_prepared_after_stop_is_ignored() {
    let (mut c, _) = coordinator(2);
    c.play_at(0);
    let stale = token(&c);
    c.stop();
    c.handle_event(PlayerEvent::Prepared {
        token: stale,
        duration_ms: Some(1),
    });
    assert_eq!(c.state().status, PlaybackStatus::Idle);
    assert!(!c.backend().calls.contains(&Call::Start));
}

#[test]
fn late_prepared_after_replay_is_ignored() {
    let (mut c, _) = coordinator(2);
    c.play_at(0);
    let stale = token(&c);
    c.play_at(1);
    c.handle_event(PlayerEvent::Prepared {
        token: stale,
        duration_ms: Some(1),
    });
    assert_eq!(c.state().status, PlaybackStatus::Preparing { index: 1 });

    prepared(&mut c);
    assert_eq!(c.state().current_index(), Some(1));
    assert!(c.state().is_playing());
}

#[test]
fn failure_goes_idle_and_stays_usable() {
    let (mut c, _) = coordinator(2);
    c.play_at(1);
    let t = token(&c);
    c.handle_event(PlayerEvent::Failed {
        token: t,
        reason: "bad header".into(),
    });
    assert_eq!(c.state().status, PlaybackStatus::Idle);
    match c.take_last_error() {
        Some(PlaybackError::PrepareFailure { locator, reason }) => {
            assert_eq!(locator.as_str(), "/music/01.mp3");
            assert_eq!(reason, "bad header");
        }
        other => panic!("unexpected {other:?}"),
    }

    c.play_at(0);
    prepared(&mut c);
    assert!(c.state().is_playing());
}

#[test]
fn completion_advances() {
    let (mut c, _) = coordinator(2);
    c.play_at(1);
    prepared(&mut c);
    let t = token(&c);
    c.handle_event(PlayerEvent::Completed { token: t });
    assert_eq!(c.state().status, PlaybackStatus::Preparing { index: 0 });
}

#[test]
fn pause_and_resume_keep_position() {
    let (mut c, position) = coordinator(1);
    c.play_at(0);
    prepared(&mut c);
    position.set(42_000);

    c.pause();
    assert_eq!(
        c.state().status,
        PlaybackStatus::Paused {
            index: 0,
            position_ms: 42_000,
            duration_ms: 120_000
        }
    );
    assert!(!c.ticker_armed());

    c.resume();
    assert!(c.state().is_playing());
    assert_eq!(c.state().position_ms(), 42_000);
    assert!(c.ticker_armed());
}

#[test]
fn toggle_flips_between_playing_and_paused() {
    let (mut c, _) = coordinator(1);
    c.play_at(0);
    prepared(&mut c);
    c.toggle_play_pause();
    assert!(matches!(c.state().status, PlaybackStatus::Paused { .. }));
    c.toggle_play_pause();
    assert!(c.state().is_playing());
}

#[test]
fn toggle_from_idle_starts_first_track() {
    let (mut c, _) = coordinator(3);
    c.toggle_play_pause();
    assert_eq!(c.state().status, PlaybackStatus::Preparing { index: 0 });

    let (mut empty, _) = coordinator(0);
    empty.toggle_play_pause();
    assert_eq!(empty.state().status, PlaybackStatus::Idle);
    assert_eq!(empty.take_last_error(), Some(PlaybackError::NoCurrentTrack));
}

#[test]
fn toggle_after_stop_replays_last_selected() {
    let (mut c, _) = coordinator(4);
    c.play_at(2);
    prepared(&mut c);
    c.stop();
    c.toggle_play_pause();
    assert_eq!(c.state().status, PlaybackStatus::Preparing { index: 2 });

    c.stop();
    c.remove(0);
    c.toggle_play_pause();
    assert_eq!(c.state().status, PlaybackStatus::Preparing { index: 1 });

    c.set_playlist(vec![track("a.mp3", None, 1_000, 0), track("b.mp3", None, 1_000, 0)]);
    c.toggle_play_pause();
    assert_eq!(c.state().status, PlaybackStatus::Preparing { index: 0 });
}

#[test]
fn pause_and_resume_without_track_are_noops() {
    let (mut c, _) = coordinator(2);
    c.pause();
    assert_eq!(c.take_last_error(), Some(PlaybackError::NoCurrentTrack));
    c.resume();
    assert_eq!(c.take_last_error(), Some(PlaybackError::NoCurrentTrack));
    assert_eq!(c.state().status, PlaybackStatus::Idle);
    assert!(c.backend().calls.iter().all(|call| *call != Call::Start && *call != Call::Pause));
}

#[test]
fn ticker_only_runs_while_playing() {
    let (mut c, position) = coordinator(1);
    assert!(!c.poll_progress(Instant::now() + TICK * 4));

    c.play_at(0);
    assert!(!c.ticker_armed());
    prepared(&mut c);
    assert!(c.ticker_armed());

    position.set(1_234);
    assert!(c.poll_progress(Instant::now() + TICK * 2));
    assert_eq!(c.state().position_ms(), 1_234);

    c.stop();
    assert!(!c.ticker_armed());
    assert!(!c.poll_progress(Instant::now() + TICK * 4));
}

#[test]
fn tick_not_due_yet_does_nothing() {
    let (mut c, _) = coordinator(1);
    c.play_at(0);
    prepared(&mut c);
    assert!(!c.poll_progress(Instant::now()));
}

#[test]
fn seek_while_preparing_applies_after_prepared() {
    let (mut c, _) = coordinator(1);
    c.play_at(0);
    c.seek(30_000);
    assert!(!c.backend().calls.contains(&Call::Seek(30_000)));

    prepared(&mut c);
    assert!(c.backend().calls.contains(&Call::Seek(30_000)));
    assert_eq!(c.state().position_ms(), 30_000);
}

#[test]
fn seek_by_clamps_at_zero() {
    let (mut c, position) = coordinator(1);
    c.play_at(0);
    prepared(&mut c);
    position.set(3_000);
    c.seek_by(-5_000);
    assert_eq!(c.state().position_ms(), 0);
    c.seek_by(5_000);
    assert_eq!(c.state().position_ms(), 5_000);
}

#[test]
fn seek_while_idle_records_error() {
    let (mut c, _) = coordinator(1);
    c.seek(1);
    assert_eq!(c.take_last_error(), Some(PlaybackError::NoCurrentTrack));
}

#[test]
fn removing_before_current_shifts_index() {
    let (mut c, _) = coordinator(4);
    c.play_at(2);
    prepared(&mut c);
    let removed = c.remove(0).expect("removed");
    assert_eq!(removed.file_name, "00.mp3");
    assert_eq!(c.state().current_index(), Some(1));
    assert_eq!(c.state().track.as_ref().map(|t| t.file_name.as_str()), Some("02.mp3"));
    assert!(c.state().is_playing());
}

#[test]
fn removing_current_stops() {
    let (mut c, _) = coordinator(3);
    c.play_at(1);
    prepared(&mut c);
    c.remove(1);
    assert_eq!(c.state().status, PlaybackStatus::Idle);
    assert_eq!(c.playlist().len(), 2);
    assert!(c.remove(9).is_none());
}

#[test]
fn moving_tracks_keeps_current_track() {
    let (mut c, _) = coordinator(4);
    c.play_at(1);
    prepared(&mut c);
    assert!(c.move_track(1, 3));
    assert_eq!(c.state().current_index(), Some(3));
    assert!(c.move_track(0, 3));
    assert_eq!(c.state().current_index(), Some(2));
    assert_eq!(c.state().track.as_ref().map(|t| t.file_name.as_str()), Some("01.mp3"));
    assert!(!c.move_track(0, 4));
}

#[test]
fn append_extends_playlist() {
    let (mut c, _) = coordinator(1);
    c.append(track("new.mp3", None, 1, 0));
    assert_eq!(c.playlist().len(), 2);
    c.play_at(1);
    assert_eq!(c.state().current_index(), Some(1));
}

#[test]
fn set_playlist_drops_playback() {
    let (mut c, _) = coordinator(2);
    c.play_at(0);
    prepared(&mut c);
    c.set_playlist(vec![track("x.mp3", None, 1, 0)]);
    assert_eq!(c.state().status, PlaybackStatus::Idle);
    assert_eq!(c.playlist().len(), 1);
}

#[test]
fn shuffle_flag_is_published() {
    let (mut c, _) = coordinator(1);
    assert!(c.toggle_shuffle());
    assert!(c.state().shuffle);
    assert!(!c.toggle_shuffle());
}

#[test]
fn subscribers_get_replay_then_updates() {
    let (mut c, _) = coordinator(2);
    c.play_at(0);
    let sub = c.subscribe();
    assert_eq!(
        sub.latest().map(|s| s.status),
        Some(PlaybackStatus::Preparing { index: 0 })
    );
    assert!(sub.latest().is_none());

    prepared(&mut c);
    assert!(sub.latest().is_some_and(|s| s.is_playing()));

    assert!(c.unsubscribe(sub.id()));
    assert!(!c.unsubscribe(sub.id()));
}

struct Recorder(Rc<RefCell<Vec<SessionDescription>>>);

impl SessionPublisher for Recorder {
    fn publish(&mut self, description: &SessionDescription) {
        self.0.borrow_mut().push(description.clone());
    }
}

#[test]
fn publisher_follows_transitions() {
    let (mut c, _) = coordinator(2);
    let seen = Rc::new(RefCell::new(Vec::new()));
    c.attach_publisher(Box::new(Recorder(seen.clone())));
    assert_eq!(seen.borrow().last().map(|d| d.status), Some(SessionStatus::Stopped));

    c.play_at(0);
    assert_eq!(seen.borrow().last().map(|d| d.status), Some(SessionStatus::Paused));
    prepared(&mut c);
    assert_eq!(seen.borrow().last().map(|d| d.status), Some(SessionStatus::Playing));
    c.pause();
    assert_eq!(seen.borrow().last().map(|d| d.status), Some(SessionStatus::Paused));
    c.stop();
    assert_eq!(seen.borrow().last().map(|d| d.status), Some(SessionStatus::Stopped));
}

struct SeekRecorder(Rc<RefCell<Vec<u64>>>);

impl SessionPublisher for SeekRecorder {
    fn publish(&mut self, _description: &SessionDescription) {}

    fn seeked(&mut self, position_ms: u64) {
        self.0.borrow_mut().push(position_ms);
    }
}

#[test]
fn applied_seeks_are_announced() {
    let (mut c, _) = coordinator(2);
    let seeks = Rc::new(RefCell::new(Vec::new()));
    c.attach_publisher(Box::new(SeekRecorder(seeks.clone())));

    c.play_at(0);
    c.seek(5_000);
    assert!(seeks.borrow().is_empty());
    prepared(&mut c);
    assert_eq!(*seeks.borrow(), vec![5_000]);

    c.seek(9_000);
    c.pause();
    c.seek(1_000);
    assert_eq!(*seeks.borrow(), vec![5_000, 9_000, 1_000]);

    c.stop();
    c.seek(2_000);
    assert_eq!(seeks.borrow().len(), 3);
}

#[test]
fn playlist_index_arithmetic() {
    assert_eq!(playlist::index_after_remove(3, 1), Some(2));
    assert_eq!(playlist::index_after_remove(3, 3), None);
    assert_eq!(playlist::index_after_remove(3, 5), Some(3));

    assert_eq!(playlist::index_after_move(2, 2, 0), 0);
    assert_eq!(playlist::index_after_move(2, 0, 4), 1);
    assert_eq!(playlist::index_after_move(2, 4, 0), 3);
    assert_eq!(playlist::index_after_move(2, 3, 4), 2);
}

#[test]
fn watch_prunes_dropped_subscribers() {
    let mut w = watch::StateWatch::new(0u32);
    let keep = w.subscribe();
    let gone = w.subscribe();
    drop(gone);
    w.publish(7);
    assert_eq!(w.subscriber_count(), 1);
    assert_eq!(keep.latest(), Some(7));
    assert_eq!(*w.current(), 7);
}

#[test]
fn ticker_rearms_after_firing() {
    let mut t = ticker::ProgressTicker::new(TICK);
    let start = Instant::now();
    assert!(!t.fire_if_due(start + TICK));
    t.arm(start);
    assert!(t.fire_if_due(start + TICK));
    assert!(!t.fire_if_due(start + TICK));
    assert!(t.fire_if_due(start + TICK * 2));
    t.cancel();
    assert!(!t.is_armed());
    assert_eq!(t.interval(), TICK);
}
