//! Collaborator traits
//!
//! The controller never touches the platform directly. The media element,
//! the document's gesture listeners and the bound UI elements are provided
//! through these traits (see the `wasm` module for browser implementations,
//! and the integration tests for recording fakes).

use crate::error::PlayRejection;
use crate::types::{ArmId, GestureKind, PlayTicket, SourceRef};

/// Playable-resource abstraction (an `<audio>` element in the browser)
///
/// `request_play` is asynchronous: the backend returns a ticket immediately
/// and later reports the outcome as [`MediaEvent::PlayResolved`].
pub trait MediaBackend {
    /// Point the element at a new source and start loading it
    fn set_source(&mut self, source: &SourceRef);

    /// Detach the current source
    fn clear_source(&mut self);

    /// Release the backing resource of `source` (revoke an object URL)
    ///
    /// Must tolerate handles that were already released.
    fn release_source(&mut self, source: &SourceRef);

    /// Ask the element to start playing
    fn request_play(&mut self) -> PlayTicket;

    /// Pause immediately (cannot fail)
    fn pause(&mut self);

    /// Current position in seconds
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Duration in seconds; NaN until metadata is available
    fn duration(&self) -> f64;

    fn set_volume(&mut self, volume: f64);

    fn set_playback_rate(&mut self, rate: f64);
}

/// Document-level gesture listeners used for autoplay recovery
///
/// A firing listener is reported back as a gesture tagged with its `ArmId`.
pub trait GestureTarget {
    /// Attach one listener per gesture kind, all tagged with `arm`
    fn arm(&mut self, arm: ArmId, kinds: &[GestureKind]);

    /// Remove every listener tagged with `arm`
    fn disarm(&mut self, arm: ArmId);
}

/// Bound UI elements of the player
///
/// Every element is optional: the default implementations do nothing, so a
/// binding only implements the elements it actually has.
pub trait PlayerView {
    /// Show the pause icon while playing, the play icon otherwise
    fn set_playing_icon(&mut self, _playing: bool) {}

    /// Progress fill width and handle offset, in percent
    fn set_progress_percent(&mut self, _percent: f64) {}

    fn set_current_time_text(&mut self, _text: &str) {}

    fn set_duration_text(&mut self, _text: &str) {}

    /// Volume bar width and handle offset, in percent
    fn set_volume_percent(&mut self, _percent: f64) {}

    /// Show or hide the result section holding the player
    fn set_visible(&mut self, _visible: bool) {}
}

/// Notifications delivered by the media backend
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Duration became available
    MetadataLoaded,

    /// Playback position changed
    TimeUpdate,

    /// Playback reached the end
    Ended,

    /// A play request settled
    PlayResolved {
        ticket: PlayTicket,
        result: Result<(), PlayRejection>,
    },
}
