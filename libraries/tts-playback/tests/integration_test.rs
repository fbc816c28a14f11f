//! Integration tests for the playback controller
//!
//! Drives the controller through recording fakes for the media element,
//! the document gesture listeners and the player view.

use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tts_playback::{
    store::keys, ArmId, AutoplayState, GestureKind, GestureTarget, MediaBackend, MediaEvent,
    PlayRejection, PlayTicket, PlaybackConfig, PlaybackController, PlaybackError,
    PlaybackOutcome, PlayerView, RejectionKind, SourceRef, Store, TransportState,
};

// ===== Test Helpers =====

#[derive(Debug)]
struct AudioLog {
    sources: Vec<String>,
    released: Vec<String>,
    cleared: usize,
    plays: u64,
    pauses: usize,
    position: f64,
    duration: f64,
    volume: f64,
    rate: f64,
}

impl Default for AudioLog {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            released: Vec::new(),
            cleared: 0,
            plays: 0,
            pauses: 0,
            position: 0.0,
            duration: f64::NAN,
            volume: 0.0,
            rate: 0.0,
        }
    }
}

struct FakeAudio(Rc<RefCell<AudioLog>>);

impl MediaBackend for FakeAudio {
    fn set_source(&mut self, source: &SourceRef) {
        let mut log = self.0.borrow_mut();
        log.sources.push(source.to_string());
        log.position = 0.0;
        log.duration = f64::NAN;
    }

    fn clear_source(&mut self) {
        self.0.borrow_mut().cleared += 1;
    }

    fn release_source(&mut self, source: &SourceRef) {
        self.0.borrow_mut().released.push(source.to_string());
    }

    fn request_play(&mut self) -> PlayTicket {
        let mut log = self.0.borrow_mut();
        log.plays += 1;
        PlayTicket(log.plays)
    }

    fn pause(&mut self) {
        self.0.borrow_mut().pauses += 1;
    }

    fn current_time(&self) -> f64 {
        self.0.borrow().position
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.0.borrow_mut().position = seconds;
    }

    fn duration(&self) -> f64 {
        self.0.borrow().duration
    }

    fn set_volume(&mut self, volume: f64) {
        self.0.borrow_mut().volume = volume;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.0.borrow_mut().rate = rate;
    }
}

#[derive(Debug, Default)]
struct GestureLog {
    armed: Vec<(ArmId, Vec<GestureKind>)>,
    disarmed: Vec<ArmId>,
    live: HashSet<ArmId>,
}

struct FakeDocument(Rc<RefCell<GestureLog>>);

impl GestureTarget for FakeDocument {
    fn arm(&mut self, arm: ArmId, kinds: &[GestureKind]) {
        let mut log = self.0.borrow_mut();
        log.armed.push((arm, kinds.to_vec()));
        log.live.insert(arm);
    }

    fn disarm(&mut self, arm: ArmId) {
        let mut log = self.0.borrow_mut();
        log.disarmed.push(arm);
        log.live.remove(&arm);
    }
}

#[derive(Debug, Default)]
struct ViewLog {
    playing_icon: Option<bool>,
    progress_percent: Option<f64>,
    current_time: String,
    duration: String,
    volume_percent: Option<f64>,
    visible: Option<bool>,
}

struct RecordingView(Rc<RefCell<ViewLog>>);

impl PlayerView for RecordingView {
    fn set_playing_icon(&mut self, playing: bool) {
        self.0.borrow_mut().playing_icon = Some(playing);
    }

    fn set_progress_percent(&mut self, percent: f64) {
        self.0.borrow_mut().progress_percent = Some(percent);
    }

    fn set_current_time_text(&mut self, text: &str) {
        self.0.borrow_mut().current_time = text.to_string();
    }

    fn set_duration_text(&mut self, text: &str) {
        self.0.borrow_mut().duration = text.to_string();
    }

    fn set_volume_percent(&mut self, percent: f64) {
        self.0.borrow_mut().volume_percent = Some(percent);
    }

    fn set_visible(&mut self, visible: bool) {
        self.0.borrow_mut().visible = Some(visible);
    }
}

struct Harness {
    controller: PlaybackController,
    audio: Rc<RefCell<AudioLog>>,
    gestures: Rc<RefCell<GestureLog>>,
    view: Rc<RefCell<ViewLog>>,
    store: Store<Value>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn harness() -> Harness {
    init_tracing();
    let audio = Rc::new(RefCell::new(AudioLog::default()));
    let gestures = Rc::new(RefCell::new(GestureLog::default()));
    let view = Rc::new(RefCell::new(ViewLog::default()));
    let store = Store::new();

    let controller = PlaybackController::new(
        PlaybackConfig::default(),
        Box::new(FakeAudio(Rc::clone(&audio))),
        Box::new(FakeDocument(Rc::clone(&gestures))),
        store.clone(),
    )
    .unwrap()
    .with_view(Box::new(RecordingView(Rc::clone(&view))));

    Harness {
        controller,
        audio,
        gestures,
        view,
        store,
    }
}

fn resolve(
    h: &mut Harness,
    ticket: PlayTicket,
    result: Result<(), PlayRejection>,
) -> tts_playback::Result<PlaybackOutcome> {
    h.controller
        .handle_event(MediaEvent::PlayResolved { ticket, result })
}

fn metadata(h: &mut Harness, duration: f64) {
    h.audio.borrow_mut().duration = duration;
    h.controller.handle_event(MediaEvent::MetadataLoaded).unwrap();
}

// ===== Loading and Release =====

#[test]
fn test_load_releases_previous_source_exactly_once() {
    let mut h = harness();

    h.controller.load(SourceRef::new("blob:a"));
    h.controller.load(SourceRef::new("blob:b"));
    assert_eq!(h.audio.borrow().released, vec!["blob:a"]);
    assert_eq!(h.audio.borrow().sources, vec!["blob:a", "blob:b"]);

    h.controller.destroy();
    h.controller.destroy();
    assert_eq!(h.audio.borrow().released, vec!["blob:a", "blob:b"]);
    assert_eq!(h.controller.transport(), TransportState::Idle);
    assert!(h.controller.session().is_none());
}

#[test]
fn test_reloading_same_source_does_not_release_it() {
    let mut h = harness();

    h.controller.load(SourceRef::new("blob:a"));
    h.controller.load(SourceRef::new("blob:a"));

    assert!(h.audio.borrow().released.is_empty());
    assert_eq!(h.controller.session().unwrap().id().0, 2);
}

#[test]
fn test_load_publishes_to_store_and_shows_player() {
    let mut h = harness();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    h.store
        .subscribe(keys::CURRENT_AUDIO, move |value: &Value| sink.borrow_mut().push(value.clone()));

    h.controller.load(SourceRef::new("blob:a"));
    assert_eq!(h.view.borrow().visible, Some(true));
    assert_eq!(h.view.borrow().duration, "0:00");

    h.controller.destroy();
    assert_eq!(h.view.borrow().visible, Some(false));

    assert_eq!(*seen.borrow(), vec![json!("blob:a"), Value::Null]);
    assert_eq!(h.store.get(keys::IS_PLAYING), Some(json!(false)));
}

#[test]
fn test_load_applies_volume_and_rate() {
    let mut h = harness();
    h.controller.set_volume(0.4);
    h.controller.set_playback_rate(1.5);

    h.controller.load(SourceRef::new("blob:a"));

    assert_eq!(h.audio.borrow().volume, 0.4);
    assert_eq!(h.audio.borrow().rate, 1.5);
}

// ===== Autoplay Recovery =====

#[test]
fn test_blocked_autoplay_retries_once_on_first_gesture() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    assert_eq!(h.controller.autoplay_state(), AutoplayState::Attempting);

    let outcome = resolve(&mut h, ticket, Err(PlayRejection::policy_blocked())).unwrap();
    assert_eq!(outcome, PlaybackOutcome::AwaitingGesture);
    assert_eq!(h.controller.autoplay_state(), AutoplayState::ArmedForGesture);
    assert!(!h.controller.is_playing());

    let (arm, kinds) = h.gestures.borrow().armed[0].clone();
    assert_eq!(
        kinds,
        vec![GestureKind::Click, GestureKind::KeyDown, GestureKind::TouchStart]
    );

    // Click and keydown from the same user action: only the first counts
    let retry = h.controller.handle_gesture(arm, GestureKind::Click);
    let PlaybackOutcome::PlayRequested(retry_ticket) = retry else {
        panic!("expected a retry");
    };
    assert!(h.gestures.borrow().live.is_empty());
    assert_eq!(
        h.controller.handle_gesture(arm, GestureKind::KeyDown),
        PlaybackOutcome::Ignored
    );
    assert_eq!(h.audio.borrow().plays, 2);

    let outcome = resolve(&mut h, retry_ticket, Ok(())).unwrap();
    assert_eq!(outcome, PlaybackOutcome::Playing);
    assert_eq!(h.controller.autoplay_state(), AutoplayState::Recovered);
    assert_eq!(h.controller.transport(), TransportState::Playing);
    assert_eq!(h.store.get(keys::IS_PLAYING), Some(json!(true)));
    assert_eq!(h.view.borrow().playing_icon, Some(true));
}

#[test]
fn test_gesture_after_recovery_is_ordinary() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    resolve(&mut h, ticket, Err(PlayRejection::policy_blocked())).unwrap();
    let arm = h.gestures.borrow().armed[0].0;

    let PlaybackOutcome::PlayRequested(retry) = h.controller.handle_gesture(arm, GestureKind::Click)
    else {
        panic!("expected a retry");
    };
    resolve(&mut h, retry, Ok(())).unwrap();

    assert_eq!(
        h.controller.handle_gesture(arm, GestureKind::Click),
        PlaybackOutcome::Ignored
    );
    assert_eq!(h.audio.borrow().plays, 2);
    assert_eq!(h.gestures.borrow().armed.len(), 1);
}

#[test]
fn test_successful_autoplay_never_arms_listeners() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));

    let outcome = resolve(&mut h, ticket, Ok(())).unwrap();

    assert_eq!(outcome, PlaybackOutcome::Playing);
    assert!(h.gestures.borrow().armed.is_empty());
}

#[test]
fn test_non_policy_rejection_fails_without_arming() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));

    let rejection = PlayRejection::new(RejectionKind::NotSupported, "no decoder");
    let err = resolve(&mut h, ticket, Err(rejection.clone())).unwrap_err();

    assert_eq!(err, PlaybackError::AutoplayFailed(rejection));
    assert_eq!(h.controller.autoplay_state(), AutoplayState::Failed);
    assert!(h.gestures.borrow().armed.is_empty());
    assert_ne!(h.controller.transport(), TransportState::Playing);
}

#[test]
fn test_failed_retry_reports_error() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    resolve(&mut h, ticket, Err(PlayRejection::policy_blocked())).unwrap();
    let arm = h.gestures.borrow().armed[0].0;
    let PlaybackOutcome::PlayRequested(retry) = h.controller.handle_gesture(arm, GestureKind::TouchStart)
    else {
        panic!("expected a retry");
    };

    let err = resolve(&mut h, retry, Err(PlayRejection::policy_blocked())).unwrap_err();

    assert!(matches!(err, PlaybackError::AutoplayFailed(_)));
    assert_eq!(h.controller.autoplay_state(), AutoplayState::Failed);
    // Never re-armed after the single retry
    assert_eq!(h.gestures.borrow().armed.len(), 1);
}

#[test]
fn test_superseded_load_ignores_stale_resolution() {
    let mut h = harness();
    let first = h.controller.load(SourceRef::new("blob:a"));
    let second = h.controller.load(SourceRef::new("blob:b"));
    assert_ne!(first, second);

    let outcome = resolve(&mut h, first, Err(PlayRejection::policy_blocked())).unwrap();

    assert_eq!(outcome, PlaybackOutcome::Ignored);
    assert!(h.gestures.borrow().armed.is_empty());
    assert_eq!(h.controller.autoplay_state(), AutoplayState::Attempting);
}

#[test]
fn test_reload_disarms_previous_listener_set() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    resolve(&mut h, ticket, Err(PlayRejection::policy_blocked())).unwrap();
    let stale_arm = h.gestures.borrow().armed[0].0;

    h.controller.load(SourceRef::new("blob:b"));

    assert!(h.gestures.borrow().disarmed.contains(&stale_arm));
    assert!(h.gestures.borrow().live.is_empty());
    assert_eq!(
        h.controller.handle_gesture(stale_arm, GestureKind::Click),
        PlaybackOutcome::Ignored
    );
    // One autoplay attempt per load, no retry for the stale gesture
    assert_eq!(h.audio.borrow().plays, 2);
}

#[test]
fn test_explicit_pause_cancels_armed_recovery() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    resolve(&mut h, ticket, Err(PlayRejection::policy_blocked())).unwrap();
    let arm = h.gestures.borrow().armed[0].0;

    assert_eq!(h.controller.pause(), PlaybackOutcome::Paused);

    assert_eq!(h.audio.borrow().pauses, 1);
    assert!(h.gestures.borrow().live.is_empty());
    assert_eq!(h.controller.autoplay_state(), AutoplayState::Idle);
    assert_eq!(
        h.controller.handle_gesture(arm, GestureKind::Click),
        PlaybackOutcome::Ignored
    );
}

#[test]
fn test_explicit_play_supersedes_armed_recovery() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    resolve(&mut h, ticket, Err(PlayRejection::policy_blocked())).unwrap();

    let PlaybackOutcome::PlayRequested(play) = h.controller.play().unwrap() else {
        panic!("expected a play request");
    };
    assert_eq!(resolve(&mut h, play, Ok(())).unwrap(), PlaybackOutcome::Playing);

    assert!(h.gestures.borrow().live.is_empty());
    assert_eq!(h.controller.autoplay_state(), AutoplayState::Idle);
}

#[test]
fn test_destroy_removes_armed_listeners() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    resolve(&mut h, ticket, Err(PlayRejection::policy_blocked())).unwrap();

    h.controller.destroy();

    assert!(h.gestures.borrow().live.is_empty());
    assert_eq!(h.audio.borrow().cleared, 1);
}

#[test]
fn test_dropping_controller_removes_armed_listeners() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    resolve(&mut h, ticket, Err(PlayRejection::policy_blocked())).unwrap();
    let gestures = Rc::clone(&h.gestures);

    drop(h);

    assert!(gestures.borrow().live.is_empty());
}

// ===== Transport =====

#[test]
fn test_toggle_without_session_is_rejected() {
    let mut h = harness();
    assert_eq!(h.controller.toggle_play(), Err(PlaybackError::NoSession));
    assert_eq!(h.controller.pause(), PlaybackOutcome::Ignored);
}

#[test]
fn test_toggle_play_and_pause() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    resolve(&mut h, ticket, Ok(())).unwrap();

    assert_eq!(h.controller.toggle_play().unwrap(), PlaybackOutcome::Paused);
    assert_eq!(h.controller.transport(), TransportState::Paused);
    assert_eq!(h.view.borrow().playing_icon, Some(false));

    let PlaybackOutcome::PlayRequested(play) = h.controller.toggle_play().unwrap() else {
        panic!("expected a play request");
    };
    // Transport only flips once the request resolves
    assert_eq!(h.controller.transport(), TransportState::Paused);
    resolve(&mut h, play, Ok(())).unwrap();
    assert!(h.controller.is_playing());
}

#[test]
fn test_rejected_toggle_leaves_transport_unchanged() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    resolve(&mut h, ticket, Ok(())).unwrap();
    h.controller.toggle_play().unwrap();

    let PlaybackOutcome::PlayRequested(play) = h.controller.toggle_play().unwrap() else {
        panic!("expected a play request");
    };
    let err = resolve(
        &mut h,
        play,
        Err(PlayRejection::new(RejectionKind::Other, "decode error")),
    )
    .unwrap_err();

    assert!(matches!(err, PlaybackError::PlayRejected(_)));
    assert_eq!(h.controller.transport(), TransportState::Paused);
    assert_eq!(h.store.get(keys::IS_PLAYING), Some(json!(false)));
}

#[test]
fn test_stop_rewinds_to_start() {
    let mut h = harness();
    h.controller.load(SourceRef::new("blob:a"));
    metadata(&mut h, 90.0);
    h.controller.seek(45.0);

    h.controller.stop();

    assert_eq!(h.controller.session().unwrap().position(), 0.0);
    assert_eq!(h.audio.borrow().position, 0.0);
    assert_eq!(h.view.borrow().current_time, "0:00");
}

#[test]
fn test_ended_keeps_final_position() {
    let mut h = harness();
    let ticket = h.controller.load(SourceRef::new("blob:a"));
    resolve(&mut h, ticket, Ok(())).unwrap();
    metadata(&mut h, 30.0);
    h.audio.borrow_mut().position = 30.0;
    h.controller.handle_event(MediaEvent::TimeUpdate).unwrap();

    let outcome = h.controller.handle_event(MediaEvent::Ended).unwrap();

    assert_eq!(outcome, PlaybackOutcome::Ended);
    assert_eq!(h.controller.transport(), TransportState::Ended);
    assert_eq!(h.controller.session().unwrap().position(), 30.0);
    assert_eq!(h.view.borrow().playing_icon, Some(false));
    assert_eq!(h.view.borrow().progress_percent, Some(100.0));
    assert_eq!(h.store.get(keys::IS_PLAYING), Some(json!(false)));
}

#[test]
fn test_events_without_session_are_ignored() {
    let mut h = harness();
    assert_eq!(
        h.controller.handle_event(MediaEvent::TimeUpdate).unwrap(),
        PlaybackOutcome::Ignored
    );
    assert_eq!(
        h.controller
            .handle_event(MediaEvent::PlayResolved {
                ticket: PlayTicket(99),
                result: Ok(()),
            })
            .unwrap(),
        PlaybackOutcome::Ignored
    );
}

// ===== Seek / Volume / Rate =====

#[test]
fn test_seek_is_noop_until_duration_known() {
    let mut h = harness();
    h.controller.load(SourceRef::new("blob:a"));

    assert!(!h.controller.seek(10.0));
    assert!(!h.controller.seek_fraction(0.5));
    assert_eq!(h.audio.borrow().position, 0.0);
}

#[test]
fn test_seek_clamps_to_duration() {
    let mut h = harness();
    h.controller.load(SourceRef::new("blob:a"));
    metadata(&mut h, 120.0);
    assert_eq!(h.controller.transport(), TransportState::Paused);
    assert_eq!(h.view.borrow().duration, "2:00");

    assert!(h.controller.seek(500.0));
    assert_eq!(h.audio.borrow().position, 120.0);

    assert!(h.controller.seek(-3.0));
    assert_eq!(h.audio.borrow().position, 0.0);

    assert!(h.controller.seek_fraction(0.5));
    assert_eq!(h.audio.borrow().position, 60.0);
    assert_eq!(h.view.borrow().progress_percent, Some(50.0));
    assert_eq!(h.view.borrow().current_time, "1:00");
    assert_eq!(h.controller.progress_fraction(), 0.5);
}

#[test]
fn test_volume_is_clamped() {
    let mut h = harness();

    assert_eq!(h.controller.set_volume(1.5), 1.0);
    assert_eq!(h.controller.set_volume(-0.2), 0.0);
    assert_eq!(h.view.borrow().volume_percent, Some(0.0));
    assert_eq!(h.controller.set_volume(f64::NAN), 0.0);
    assert_eq!(h.controller.set_volume(0.25), 0.25);
    assert_eq!(h.audio.borrow().volume, 0.25);
    assert_eq!(h.view.borrow().volume_percent, Some(25.0));
}

#[test]
fn test_playback_rate_is_clamped() {
    let mut h = harness();

    assert_eq!(h.controller.set_playback_rate(10.0), 4.0);
    assert_eq!(h.controller.set_playback_rate(0.1), 0.25);
    assert_eq!(h.controller.set_playback_rate(-1.0), 0.25);
    assert_eq!(h.controller.set_playback_rate(1.25), 1.25);
    assert_eq!(h.audio.borrow().rate, 1.25);
}

#[test]
fn test_controller_without_view_still_works() {
    let audio = Rc::new(RefCell::new(AudioLog::default()));
    let gestures = Rc::new(RefCell::new(GestureLog::default()));
    let mut controller = PlaybackController::new(
        PlaybackConfig::default(),
        Box::new(FakeAudio(Rc::clone(&audio))),
        Box::new(FakeDocument(gestures)),
        Store::new(),
    )
    .unwrap();

    let ticket = controller.load(SourceRef::new("blob:a"));
    controller
        .handle_event(MediaEvent::PlayResolved {
            ticket,
            result: Ok(()),
        })
        .unwrap();
    audio.borrow_mut().duration = 10.0;
    controller.handle_event(MediaEvent::MetadataLoaded).unwrap();
    assert!(controller.seek(5.0));
    controller.set_volume(0.5);
    controller.destroy();

    assert_eq!(audio.borrow().released, vec!["blob:a"]);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = PlaybackConfig {
        volume: 2.0,
        ..PlaybackConfig::default()
    };
    let result = PlaybackController::new(
        config,
        Box::new(FakeAudio(Rc::default())),
        Box::new(FakeDocument(Rc::default())),
        Store::new(),
    );
    assert!(matches!(result, Err(PlaybackError::InvalidConfig(_))));
}
