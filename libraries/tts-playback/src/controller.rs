//! Playback controller - owns the single active media session
//!
//! Coordinates the media backend, autoplay recovery, the shared store and the
//! bound player view. The backend is exclusively owned here; drag tracks and
//! other callers go through the public operations.

use crate::{
    autoplay::{AutoplayOutcome, AutoplayRecovery, AutoplayState},
    backend::{GestureTarget, MediaBackend, MediaEvent, PlayerView},
    error::{PlayRejection, PlaybackError, Result},
    format::{format_time, progress_fraction},
    store::{keys, Store},
    types::{ArmId, GestureKind, PlayTicket, PlaybackConfig, SessionId, SourceRef, TransportState},
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// One loaded audio resource
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    id: SessionId,
    source: SourceRef,
    duration: Option<f64>,
    position: f64,
}

impl PlaybackSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// Duration in seconds, `None` until metadata has loaded
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn position(&self) -> f64 {
        self.position
    }
}

/// Result of a controller operation or event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Nothing changed (stale or irrelevant input)
    Ignored,

    /// Position, duration or projection refreshed
    Updated,

    /// A play request is in flight
    PlayRequested(PlayTicket),

    /// Playback is running
    Playing,

    /// Playback paused
    Paused,

    /// Autoplay was blocked; a gesture will retry
    AwaitingGesture,

    /// Playback reached the end
    Ended,
}

/// Owns transport state for one media element
pub struct PlaybackController {
    backend: Box<dyn MediaBackend>,
    gestures: Box<dyn GestureTarget>,
    view: Option<Box<dyn PlayerView>>,
    store: Store<Value>,
    recovery: AutoplayRecovery,
    config: PlaybackConfig,

    session: Option<PlaybackSession>,
    transport: TransportState,
    volume: f64,
    playback_rate: f64,
    next_session: u64,

    /// Explicit (non-autoplay) play request awaiting resolution
    user_play: Option<(PlayTicket, SessionId)>,
}

impl PlaybackController {
    /// Create a controller
    ///
    /// Applies the configured volume and rate to the backend right away.
    pub fn new(
        config: PlaybackConfig,
        backend: Box<dyn MediaBackend>,
        gestures: Box<dyn GestureTarget>,
        store: Store<Value>,
    ) -> Result<Self> {
        config.validate()?;

        let mut controller = Self {
            backend,
            gestures,
            view: None,
            store,
            recovery: AutoplayRecovery::new(config.recovery_gestures.clone()),
            volume: config.volume,
            playback_rate: config.playback_rate,
            config,
            session: None,
            transport: TransportState::Idle,
            next_session: 0,
            user_play: None,
        };

        controller.backend.set_volume(controller.volume);
        controller.backend.set_playback_rate(controller.playback_rate);
        Ok(controller)
    }

    /// Bind the player view and project the current state onto it
    pub fn with_view(mut self, view: Box<dyn PlayerView>) -> Self {
        self.set_view(Some(view));
        self
    }

    pub fn set_view(&mut self, view: Option<Box<dyn PlayerView>>) {
        self.view = view;
        let playing = self.transport == TransportState::Playing;
        let volume_percent = self.volume * 100.0;
        let has_session = self.session.is_some();
        self.project(|view| {
            view.set_playing_icon(playing);
            view.set_volume_percent(volume_percent);
            view.set_visible(has_session);
        });
        self.project_position();
        self.project_duration();
    }

    // ===== Queries =====

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn autoplay_state(&self) -> AutoplayState {
        self.recovery.state()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn is_playing(&self) -> bool {
        self.transport == TransportState::Playing
    }

    /// Position as a fraction of the duration (0.0 when unknown)
    pub fn progress_fraction(&self) -> f64 {
        self.session
            .as_ref()
            .map_or(0.0, |s| progress_fraction(s.position, s.duration))
    }

    pub fn store(&self) -> &Store<Value> {
        &self.store
    }

    // ===== Loading =====

    /// Replace the current session with `source` and try to autoplay it
    ///
    /// The previous source is released exactly once before the new one is
    /// assigned. Returns the ticket of the autoplay attempt.
    pub fn load(&mut self, source: SourceRef) -> PlayTicket {
        if let Some(previous) = self.session.take() {
            if previous.source == source {
                debug!(%source, "Reloading the same source, not releasing it");
            } else {
                self.backend.release_source(&previous.source);
                debug!(source = %previous.source, "Released previous source");
            }
        }

        self.next_session += 1;
        let id = SessionId(self.next_session);
        self.user_play = None;

        self.backend.set_source(&source);
        self.backend.set_volume(self.volume);
        self.backend.set_playback_rate(self.playback_rate);

        self.store.set_state([
            (keys::CURRENT_AUDIO, json!(source.as_str())),
            (keys::IS_PLAYING, json!(false)),
        ]);

        info!(session = id.0, %source, "Loading audio");
        self.session = Some(PlaybackSession {
            id,
            source,
            duration: None,
            position: 0.0,
        });
        self.transport = TransportState::Loading;

        self.project(|view| {
            view.set_playing_icon(false);
            view.set_visible(true);
        });
        self.project_position();
        self.project_duration();

        self.recovery
            .attempt(id, self.backend.as_mut(), self.gestures.as_mut())
    }

    /// Stop playback, release the source and clear the session
    pub fn destroy(&mut self) {
        self.recovery.cancel(self.gestures.as_mut());
        self.user_play = None;

        if let Some(session) = self.session.take() {
            self.backend.pause();
            self.backend.clear_source();
            self.backend.release_source(&session.source);
            info!(session = session.id.0, "Playback session destroyed");
        }

        self.transport = TransportState::Idle;
        self.store.set_state([
            (keys::CURRENT_AUDIO, Value::Null),
            (keys::IS_PLAYING, json!(false)),
        ]);
        self.project(|view| {
            view.set_playing_icon(false);
            view.set_visible(false);
        });
        self.project_position();
        self.project_duration();
    }

    // ===== Transport =====

    /// Pause when playing, otherwise request playback
    pub fn toggle_play(&mut self) -> Result<PlaybackOutcome> {
        if self.session.is_none() {
            return Err(PlaybackError::NoSession);
        }

        if self.transport == TransportState::Playing {
            Ok(self.pause())
        } else {
            self.play()
        }
    }

    /// Request playback
    ///
    /// The transport only changes once the request resolves successfully.
    pub fn play(&mut self) -> Result<PlaybackOutcome> {
        let id = self.session.as_ref().ok_or(PlaybackError::NoSession)?.id;

        let ticket = self.backend.request_play();
        self.user_play = Some((ticket, id));
        debug!(session = id.0, ticket = ticket.0, "Play requested");
        Ok(PlaybackOutcome::PlayRequested(ticket))
    }

    /// Pause immediately
    pub fn pause(&mut self) -> PlaybackOutcome {
        if self.session.is_none() {
            return PlaybackOutcome::Ignored;
        }

        // An explicit pause wins over a pending autoplay retry
        if matches!(
            self.recovery.state(),
            AutoplayState::Attempting
                | AutoplayState::Blocked
                | AutoplayState::ArmedForGesture
                | AutoplayState::Retrying
        ) {
            self.recovery.cancel(self.gestures.as_mut());
        }
        self.user_play = None;
        self.backend.pause();

        if matches!(
            self.transport,
            TransportState::Playing | TransportState::Loading
        ) {
            self.transport = TransportState::Paused;
        }
        self.mark_stopped();
        PlaybackOutcome::Paused
    }

    /// Pause and rewind to the start
    pub fn stop(&mut self) -> PlaybackOutcome {
        let outcome = self.pause();
        if outcome == PlaybackOutcome::Ignored {
            return outcome;
        }

        self.backend.set_current_time(0.0);
        if let Some(session) = self.session.as_mut() {
            session.position = 0.0;
        }
        self.project_position();
        outcome
    }

    /// Seek to `target` seconds, clamped to the duration
    ///
    /// No-op (returns false) while the duration is unknown.
    pub fn seek(&mut self, target: f64) -> bool {
        if !target.is_finite() {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(duration) = session.duration else {
            debug!("Seek ignored, duration unknown");
            return false;
        };

        let position = target.clamp(0.0, duration);
        session.position = position;
        self.backend.set_current_time(position);
        self.project_position();
        true
    }

    /// Seek to a fraction of the duration (scrubber input)
    pub fn seek_fraction(&mut self, fraction: f64) -> bool {
        if !fraction.is_finite() {
            return false;
        }
        let Some(duration) = self.session.as_ref().and_then(|s| s.duration) else {
            return false;
        };
        self.seek(duration * fraction.clamp(0.0, 1.0))
    }

    /// Set the volume fraction (clamped to 0.0-1.0); returns the applied value
    pub fn set_volume(&mut self, volume: f64) -> f64 {
        if !volume.is_finite() {
            return self.volume;
        }

        self.volume = volume.clamp(0.0, 1.0);
        self.backend.set_volume(self.volume);
        let percent = self.volume * 100.0;
        self.project(|view| view.set_volume_percent(percent));
        self.volume
    }

    /// Set the playback rate (clamped to configured bounds); returns the applied value
    pub fn set_playback_rate(&mut self, rate: f64) -> f64 {
        if !rate.is_finite() || rate <= 0.0 {
            warn!(rate, "Ignoring invalid playback rate");
            return self.playback_rate;
        }

        self.playback_rate = rate.clamp(self.config.min_playback_rate, self.config.max_playback_rate);
        self.backend.set_playback_rate(self.playback_rate);
        self.playback_rate
    }

    // ===== Backend events =====

    /// Handle a notification from the media backend
    pub fn handle_event(&mut self, event: MediaEvent) -> Result<PlaybackOutcome> {
        if self.session.is_none() {
            debug!(?event, "Ignoring media event without a session");
            return Ok(PlaybackOutcome::Ignored);
        }

        match event {
            MediaEvent::MetadataLoaded => {
                self.on_metadata_loaded();
                Ok(PlaybackOutcome::Updated)
            }
            MediaEvent::TimeUpdate => {
                self.on_time_update();
                Ok(PlaybackOutcome::Updated)
            }
            MediaEvent::Ended => {
                self.on_ended();
                Ok(PlaybackOutcome::Ended)
            }
            MediaEvent::PlayResolved { ticket, result } => self.on_play_resolved(ticket, result),
        }
    }

    /// Handle a gesture from an armed listener set
    pub fn handle_gesture(&mut self, arm: ArmId, kind: GestureKind) -> PlaybackOutcome {
        let Some(id) = self.session.as_ref().map(|s| s.id) else {
            return PlaybackOutcome::Ignored;
        };

        match self.recovery.on_gesture(
            id,
            arm,
            kind,
            self.backend.as_mut(),
            self.gestures.as_mut(),
        ) {
            AutoplayOutcome::RetryIssued(ticket) => PlaybackOutcome::PlayRequested(ticket),
            _ => PlaybackOutcome::Ignored,
        }
    }

    fn on_metadata_loaded(&mut self) {
        let duration = self.backend.duration();
        if let Some(session) = self.session.as_mut() {
            session.duration = (duration.is_finite() && duration >= 0.0).then_some(duration);
        }
        if self.transport == TransportState::Loading {
            self.transport = TransportState::Paused;
        }
        self.project_duration();
    }

    fn on_time_update(&mut self) {
        let position = self.backend.current_time();
        if let Some(session) = self.session.as_mut() {
            if position.is_finite() {
                session.position = position.max(0.0);
            }
        }
        self.project_position();
    }

    fn on_ended(&mut self) {
        self.transport = TransportState::Ended;
        self.user_play = None;
        self.mark_stopped();
        debug!("Playback ended");
    }

    fn on_play_resolved(
        &mut self,
        ticket: PlayTicket,
        result: std::result::Result<(), PlayRejection>,
    ) -> Result<PlaybackOutcome> {
        let Some(id) = self.session.as_ref().map(|s| s.id) else {
            return Ok(PlaybackOutcome::Ignored);
        };

        if self.recovery.owns_ticket(ticket) {
            return match self
                .recovery
                .on_play_resolved(id, ticket, result, self.gestures.as_mut())
            {
                AutoplayOutcome::Recovered => {
                    self.mark_playing();
                    Ok(PlaybackOutcome::Playing)
                }
                AutoplayOutcome::AwaitingGesture => Ok(PlaybackOutcome::AwaitingGesture),
                AutoplayOutcome::Failed(rejection) => Err(PlaybackError::AutoplayFailed(rejection)),
                AutoplayOutcome::Ignored | AutoplayOutcome::RetryIssued(_) => {
                    Ok(PlaybackOutcome::Ignored)
                }
            };
        }

        if self.user_play != Some((ticket, id)) {
            debug!(ticket = ticket.0, "Ignoring stale play resolution");
            return Ok(PlaybackOutcome::Ignored);
        }
        self.user_play = None;

        match result {
            Ok(()) => {
                // Explicit playback supersedes any recovery still in progress
                if !matches!(
                    self.recovery.state(),
                    AutoplayState::Recovered | AutoplayState::Failed
                ) {
                    self.recovery.cancel(self.gestures.as_mut());
                }
                self.mark_playing();
                Ok(PlaybackOutcome::Playing)
            }
            Err(rejection) => {
                warn!(%rejection, "Play request rejected");
                Err(PlaybackError::PlayRejected(rejection))
            }
        }
    }

    // ===== Projection =====

    fn mark_playing(&mut self) {
        self.transport = TransportState::Playing;
        self.store.set(keys::IS_PLAYING, json!(true));
        self.project(|view| view.set_playing_icon(true));
    }

    fn mark_stopped(&mut self) {
        self.store.set(keys::IS_PLAYING, json!(false));
        self.project(|view| view.set_playing_icon(false));
    }

    fn project_position(&mut self) {
        let (position, percent) = self.session.as_ref().map_or((0.0, 0.0), |s| {
            (s.position, progress_fraction(s.position, s.duration) * 100.0)
        });
        let text = format_time(position);
        self.project(|view| {
            view.set_progress_percent(percent);
            view.set_current_time_text(&text);
        });
    }

    fn project_duration(&mut self) {
        let duration = self
            .session
            .as_ref()
            .and_then(|s| s.duration)
            .unwrap_or(f64::NAN);
        let text = format_time(duration);
        self.project(|view| view.set_duration_text(&text));
    }

    /// Run `f` against the bound view; no-op when nothing is bound
    fn project<F>(&mut self, f: F)
    where
        F: FnOnce(&mut dyn PlayerView),
    {
        if let Some(view) = self.view.as_mut() {
            f(view.as_mut());
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        // Armed document listeners must not outlive the controller
        self.recovery.cancel(self.gestures.as_mut());
    }
}
