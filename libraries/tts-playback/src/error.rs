//! Error types for playback control

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the media backend refused a play request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionKind {
    /// The environment requires a user gesture before playback may start
    PolicyBlocked,

    /// The request was interrupted by a newer load or pause
    Aborted,

    /// No supported source, or the resource could not be decoded
    NotSupported,

    /// Anything else reported by the backend
    Other,
}

/// A rejected play request, as reported by the media backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRejection {
    pub kind: RejectionKind,
    pub message: String,
}

impl PlayRejection {
    pub fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a gesture-required rejection
    pub fn policy_blocked() -> Self {
        Self::new(
            RejectionKind::PolicyBlocked,
            "play() requires a prior user gesture",
        )
    }

    pub fn is_policy_blocked(&self) -> bool {
        self.kind == RejectionKind::PolicyBlocked
    }
}

impl std::fmt::Display for PlayRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Playback errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// No source has been loaded
    #[error("No audio loaded")]
    NoSession,

    /// The backend rejected a play request
    #[error("Playback rejected: {0}")]
    PlayRejected(PlayRejection),

    /// Autoplay could not be recovered, even after a user gesture
    #[error("Autoplay failed: {0}")]
    AutoplayFailed(PlayRejection),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
