//! Autoplay recovery state machine
//!
//! Browsers reject unsolicited `play()` calls until the user has interacted
//! with the page. That rejection is recoverable: after a policy block we arm
//! a one-shot set of document gesture listeners and retry exactly once on the
//! first gesture.
//!
//! ```text
//! Idle ──attempt──► Attempting ──ok──────────────► Recovered
//!                       │
//!                       ├──policy-blocked──► Blocked ──arm──► ArmedForGesture
//!                       │                                          │
//!                       └──other──► Failed          first gesture (disarm all)
//!                                                                  ▼
//!                                   Failed ◄──err── Retrying ──ok──► Recovered
//! ```
//!
//! Every resolution and gesture is matched against the session that issued
//! it, so events from a superseded load never touch the new one.

use crate::backend::{GestureTarget, MediaBackend};
use crate::error::PlayRejection;
use crate::types::{ArmId, GestureKind, PlayTicket, SessionId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Recovery state for the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoplayState {
    /// No attempt made yet (or cancelled)
    Idle,

    /// First play request in flight
    Attempting,

    /// First request was policy-blocked; listeners about to be armed
    Blocked,

    /// Waiting for the first user gesture
    ArmedForGesture,

    /// Post-gesture retry in flight
    Retrying,

    /// Playback started (terminal for this session)
    Recovered,

    /// Playback could not be started (terminal for this session)
    Failed,
}

/// What a recovery step means for the caller
#[derive(Debug, Clone, PartialEq)]
pub enum AutoplayOutcome {
    /// Event does not belong to the current cycle
    Ignored,

    /// Playback was blocked; waiting for a gesture (not an error)
    AwaitingGesture,

    /// A gesture arrived and the single retry was issued
    RetryIssued(PlayTicket),

    /// Playback started
    Recovered,

    /// Playback failed for good
    Failed(PlayRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingPlay {
    ticket: PlayTicket,
    session: SessionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedSet {
    arm: ArmId,
    session: SessionId,
}

/// Drives playback start-up through browser autoplay policies
#[derive(Debug)]
pub struct AutoplayRecovery {
    state: AutoplayState,
    pending: Option<PendingPlay>,
    armed: Option<ArmedSet>,
    next_arm: u64,
    gestures: Vec<GestureKind>,
}

impl AutoplayRecovery {
    /// Create a recovery machine that arms `gestures` when blocked
    pub fn new(gestures: Vec<GestureKind>) -> Self {
        Self {
            state: AutoplayState::Idle,
            pending: None,
            armed: None,
            next_arm: 0,
            gestures,
        }
    }

    pub fn state(&self) -> AutoplayState {
        self.state
    }

    /// Identity of the currently armed listener set, if any
    pub fn armed(&self) -> Option<ArmId> {
        self.armed.map(|set| set.arm)
    }

    /// Whether `ticket` is the play request this machine is waiting on
    pub fn owns_ticket(&self, ticket: PlayTicket) -> bool {
        self.pending.is_some_and(|p| p.ticket == ticket)
    }

    /// Start a new cycle for `session`
    ///
    /// Any listeners still armed for a previous session are disarmed first.
    pub fn attempt(
        &mut self,
        session: SessionId,
        backend: &mut dyn MediaBackend,
        target: &mut dyn GestureTarget,
    ) -> PlayTicket {
        self.disarm(target);

        let ticket = backend.request_play();
        self.pending = Some(PendingPlay { ticket, session });
        self.state = AutoplayState::Attempting;

        debug!(session = session.0, ticket = ticket.0, "Attempting autoplay");
        ticket
    }

    /// Feed the outcome of a play request issued by this machine
    pub fn on_play_resolved(
        &mut self,
        session: SessionId,
        ticket: PlayTicket,
        result: Result<(), PlayRejection>,
        target: &mut dyn GestureTarget,
    ) -> AutoplayOutcome {
        let expected = PendingPlay { ticket, session };
        if self.pending != Some(expected) {
            debug!(ticket = ticket.0, "Ignoring stale play resolution");
            return AutoplayOutcome::Ignored;
        }
        self.pending = None;

        match (self.state, result) {
            (AutoplayState::Attempting | AutoplayState::Retrying, Ok(())) => {
                info!(session = session.0, "Autoplay started");
                self.state = AutoplayState::Recovered;
                AutoplayOutcome::Recovered
            }
            (AutoplayState::Attempting, Err(rejection)) if rejection.is_policy_blocked() => {
                self.state = AutoplayState::Blocked;
                self.arm(session, rejection, target)
            }
            (AutoplayState::Attempting | AutoplayState::Retrying, Err(rejection)) => {
                warn!(session = session.0, %rejection, "Autoplay failed");
                self.state = AutoplayState::Failed;
                AutoplayOutcome::Failed(rejection)
            }
            (state, _) => {
                warn!(?state, "Play resolution arrived in unexpected state");
                AutoplayOutcome::Ignored
            }
        }
    }

    /// Feed a gesture reported by the gesture target
    ///
    /// Only the first gesture on the current armed set counts: it disarms
    /// every listener and then issues the single retry.
    pub fn on_gesture(
        &mut self,
        session: SessionId,
        arm: ArmId,
        kind: GestureKind,
        backend: &mut dyn MediaBackend,
        target: &mut dyn GestureTarget,
    ) -> AutoplayOutcome {
        let current = ArmedSet { arm, session };
        if self.state != AutoplayState::ArmedForGesture || self.armed != Some(current) {
            debug!(arm = arm.0, ?kind, "Ignoring gesture for inactive listener set");
            return AutoplayOutcome::Ignored;
        }

        self.disarm(target);

        let ticket = backend.request_play();
        self.pending = Some(PendingPlay { ticket, session });
        self.state = AutoplayState::Retrying;

        info!(session = session.0, ?kind, ticket = ticket.0, "Retrying playback after gesture");
        AutoplayOutcome::RetryIssued(ticket)
    }

    /// Abandon the current cycle and remove any armed listeners
    pub fn cancel(&mut self, target: &mut dyn GestureTarget) {
        self.disarm(target);
        self.pending = None;
        self.state = AutoplayState::Idle;
    }

    fn arm(
        &mut self,
        session: SessionId,
        rejection: PlayRejection,
        target: &mut dyn GestureTarget,
    ) -> AutoplayOutcome {
        if self.gestures.is_empty() {
            warn!("Autoplay blocked and no recovery gestures configured");
            self.state = AutoplayState::Failed;
            return AutoplayOutcome::Failed(rejection);
        }

        self.disarm(target);
        let arm = ArmId(self.next_arm);
        self.next_arm += 1;

        target.arm(arm, &self.gestures);
        self.armed = Some(ArmedSet { arm, session });
        self.state = AutoplayState::ArmedForGesture;

        info!(session = session.0, arm = arm.0, "Autoplay blocked, waiting for a user gesture");
        AutoplayOutcome::AwaitingGesture
    }

    fn disarm(&mut self, target: &mut dyn GestureTarget) {
        if let Some(set) = self.armed.take() {
            target.disarm(set.arm);
            debug!(arm = set.arm.0, "Disarmed gesture listeners");
        }
    }
}
