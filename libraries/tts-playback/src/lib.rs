//! Speech Playback - Playback Control
//!
//! Browser-side playback control for synthesized speech.
//!
//! This crate provides:
//! - A keyed publish/subscribe [`Store`] shared by independent UI fragments
//! - [`DragTrack`] for click-to-set and press-and-drag linear controls
//! - [`AutoplayRecovery`], which retries a policy-blocked `play()` exactly
//!   once on the next user gesture
//! - [`PlaybackController`], which owns the media session: load, transport,
//!   seek, volume, rate and the player projection
//! - [`TimerManager`] for debounce/throttle scheduling
//!
//! # Architecture
//!
//! `tts-playback` is platform-agnostic and single-threaded:
//! - The media element, the document's gesture listeners and the bound UI
//!   elements are reached through the [`MediaBackend`], [`GestureTarget`] and
//!   [`PlayerView`] traits
//! - Asynchronous play requests are tickets resolved later via
//!   [`MediaEvent::PlayResolved`]
//! - Browser implementations live behind the `wasm` feature
//!
//! # Example: Autoplay recovery
//!
//! ```rust
//! use tts_playback::{
//!     ArmId, GestureKind, GestureTarget, MediaBackend, MediaEvent, PlayRejection,
//!     PlayTicket, PlaybackConfig, PlaybackController, PlaybackOutcome, SourceRef, Store,
//! };
//!
//! # #[derive(Default)]
//! # struct Audio { plays: u64 }
//! # impl MediaBackend for Audio {
//! #     fn set_source(&mut self, _: &SourceRef) {}
//! #     fn clear_source(&mut self) {}
//! #     fn release_source(&mut self, _: &SourceRef) {}
//! #     fn request_play(&mut self) -> PlayTicket { self.plays += 1; PlayTicket(self.plays) }
//! #     fn pause(&mut self) {}
//! #     fn current_time(&self) -> f64 { 0.0 }
//! #     fn set_current_time(&mut self, _: f64) {}
//! #     fn duration(&self) -> f64 { f64::NAN }
//! #     fn set_volume(&mut self, _: f64) {}
//! #     fn set_playback_rate(&mut self, _: f64) {}
//! # }
//! # struct Document;
//! # impl GestureTarget for Document {
//! #     fn arm(&mut self, _: ArmId, _: &[GestureKind]) {}
//! #     fn disarm(&mut self, _: ArmId) {}
//! # }
//! let mut controller = PlaybackController::new(
//!     PlaybackConfig::default(),
//!     Box::new(Audio::default()),
//!     Box::new(Document),
//!     Store::new(),
//! )
//! .unwrap();
//!
//! let ticket = controller.load(SourceRef::new("blob:https://example.com/1"));
//!
//! // The browser refuses to play without a user gesture...
//! let outcome = controller
//!     .handle_event(MediaEvent::PlayResolved {
//!         ticket,
//!         result: Err(PlayRejection::policy_blocked()),
//!     })
//!     .unwrap();
//! assert_eq!(outcome, PlaybackOutcome::AwaitingGesture);
//! ```

mod autoplay;
mod backend;
mod controller;
mod drag;
mod error;
pub mod format;
pub mod store;
mod timers;
pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use autoplay::{AutoplayOutcome, AutoplayRecovery, AutoplayState};
pub use backend::{GestureTarget, MediaBackend, MediaEvent, PlayerView};
pub use controller::{PlaybackController, PlaybackOutcome, PlaybackSession};
pub use drag::{DragTrack, PointerEvent, TrackBounds};
pub use error::{PlayRejection, PlaybackError, RejectionKind, Result};
pub use format::format_time;
pub use store::{Store, Subscription};
pub use timers::TimerManager;
pub use types::{
    ArmId, GestureKind, PlayTicket, PlaybackConfig, SessionId, SourceRef, TransportState,
};
