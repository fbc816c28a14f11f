//! Core types for playback control

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to playable media (usually an object URL)
///
/// Owned exclusively by the controller. A handle is released exactly once,
/// when it is superseded by a new load or the controller is destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity of one loaded session
///
/// Increases on every load. Late events carrying an older id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Handle for an in-flight play request, issued by the media backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayTicket(pub u64);

/// Identity of one armed gesture-listener set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArmId(pub u64);

/// User gestures that satisfy an autoplay policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    Click,
    KeyDown,
    TouchStart,
}

impl GestureKind {
    /// DOM event type for this gesture
    pub fn event_type(self) -> &'static str {
        match self {
            GestureKind::Click => "click",
            GestureKind::KeyDown => "keydown",
            GestureKind::TouchStart => "touchstart",
        }
    }
}

/// Transport state of the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    /// Nothing loaded
    Idle,

    /// Source assigned, waiting for metadata or the first play request
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track (or ready but not started)
    Paused,

    /// Reached the end; position is kept until an explicit restart
    Ended,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume fraction (0.0-1.0, default: 1.0)
    pub volume: f64,

    /// Initial playback rate (default: 1.0)
    pub playback_rate: f64,

    /// Slowest accepted playback rate (default: 0.25)
    pub min_playback_rate: f64,

    /// Fastest accepted playback rate (default: 4.0)
    pub max_playback_rate: f64,

    /// Gestures armed after a policy-blocked autoplay
    pub recovery_gestures: Vec<GestureKind>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            playback_rate: 1.0,
            min_playback_rate: 0.25,
            max_playback_rate: 4.0,
            recovery_gestures: vec![
                GestureKind::Click,
                GestureKind::KeyDown,
                GestureKind::TouchStart,
            ],
        }
    }
}

impl PlaybackConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(PlaybackError::InvalidConfig(format!(
                "volume must be within 0.0-1.0, got {}",
                self.volume
            )));
        }

        if !(self.min_playback_rate > 0.0 && self.min_playback_rate <= self.max_playback_rate) {
            return Err(PlaybackError::InvalidConfig(format!(
                "playback rate bounds are invalid: {}-{}",
                self.min_playback_rate, self.max_playback_rate
            )));
        }

        if !(self.min_playback_rate..=self.max_playback_rate).contains(&self.playback_rate) {
            return Err(PlaybackError::InvalidConfig(format!(
                "playback rate {} is outside {}-{}",
                self.playback_rate, self.min_playback_rate, self.max_playback_rate
            )));
        }

        if self.recovery_gestures.is_empty() {
            return Err(PlaybackError::InvalidConfig(
                "at least one recovery gesture is required".to_string(),
            ));
        }

        Ok(())
    }
}
