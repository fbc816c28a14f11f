//! Error types for the speech page

use thiserror::Error;
use tts_playback::PlaybackError;

/// Application errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid synthesis parameters: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("A synthesis request is already in progress")]
    Busy,

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("History error: {0}")]
    History(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
