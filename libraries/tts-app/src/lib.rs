//! Speech Playback - Page Logic
//!
//! Everything on the synthesis page above the player itself:
//! - [`SynthesisFlow`] validates a request, calls the [`Synthesizer`], loads
//!   the result into the [`tts_playback::PlaybackController`] and records it
//!   in the history
//! - Page fragments ([`CharCounter`], [`InputModeToggle`], [`HistoryPanel`])
//!   that read and write the shared store
//! - Share links for reader apps, the metrics strip and the voice catalog
//!
//! All fragments share one [`tts_playback::Store`], created by
//! [`state::initial_store`].

mod config;
mod error;
pub mod fragments;
pub mod history;
pub mod links;
pub mod metrics;
pub mod state;
mod synthesis;
pub mod validation;
pub mod voices;

// Public exports
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use fragments::{CharCounter, CharLevel, HistoryPanel, InputModeToggle, Shortcut};
pub use history::{HistoryItem, HistoryRepository, MemoryHistory};
pub use metrics::{parse_metrics, success_rate, MetricsPoller, MetricsSummary};
pub use state::{initial_store, FormData, SynthesisParams};
pub use synthesis::{Notifier, SynthesisFlow, Synthesizer};
pub use voices::{Voice, VoiceCatalog, VoiceSearch};
