use super::*;
use crate::library::tests::track;

fn state(status: PlaybackStatus, track: Option<crate::library::Track>) -> PlaybackState {
    PlaybackState {
        status,
        track,
        shuffle: false,
    }
}

#[test]
fn idle_offers_only_play() {
    let d = describe(&PlaybackState::default());
    assert_eq!(d.status, SessionStatus::Stopped);
    assert_eq!(d.title, APP_NAME);
    assert_eq!(d.artist, NO_TRACK_ARTIST);
    assert_eq!(
        d.actions,
        TransportActions {
            play: true,
            ..TransportActions::default()
        }
    );
    assert!(d.locator.is_none());
}

#[test]
fn playing_offers_pause_not_play() {
    let mut t = track("a.mp3", Some("Alpha"), 200_000, 0);
    t.artist = Some("Band".into());
    let d = describe(&state(
        PlaybackStatus::Playing {
            index: 2,
            position_ms: 1_500,
            duration_ms: 199_000,
        },
        Some(t),
    ));
    assert_eq!(d.status, SessionStatus::Playing);
    assert!(d.actions.pause);
    assert!(!d.actions.play);
    assert!(d.actions.next && d.actions.previous && d.actions.stop && d.actions.seek);
    assert_eq!(d.title, "Alpha");
    assert_eq!(d.artist, "Band");
    assert_eq!(d.duration_ms, 199_000);
    assert_eq!(d.position_ms, 1_500);
    assert_eq!(d.track_index, Some(2));
}

#[test]
fn paused_offers_play_not_pause() {
    let t = track("a.mp3", None, 90_000, 0);
    let d = describe(&state(
        PlaybackStatus::Paused {
            index: 0,
            position_ms: 10,
            duration_ms: 90_000,
        },
        Some(t),
    ));
    assert_eq!(d.status, SessionStatus::Paused);
    assert!(d.actions.play);
    assert!(!d.actions.pause);
}

#[test]
fn preparing_counts_as_paused_and_uses_catalog_duration() {
    let t = track("song.mp3", None, 123_000, 0);
    let d = describe(&state(PlaybackStatus::Preparing { index: 0 }, Some(t)));
    assert_eq!(d.status, SessionStatus::Paused);
    assert_eq!(d.duration_ms, 123_000);
    assert_eq!(d.title, "song.mp3");
    assert_eq!(d.artist, UNKNOWN_ARTIST);
}

#[test]
fn blank_artist_falls_back() {
    let mut t = track("a.mp3", Some("A"), 1, 0);
    t.artist = Some("  ".into());
    let d = describe(&state(PlaybackStatus::Preparing { index: 0 }, Some(t)));
    assert_eq!(d.artist, UNKNOWN_ARTIST);
}

#[test]
fn describing_twice_gives_equal_results() {
    let s = state(
        PlaybackStatus::Playing {
            index: 0,
            position_ms: 5,
            duration_ms: 10,
        },
        Some(track("a.mp3", Some("A"), 10, 0)),
    );
    assert_eq!(describe(&s), describe(&s));
}
