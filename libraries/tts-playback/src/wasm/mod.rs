//! WASM bindings for tts-playback
//!
//! Browser implementations of the collaborator traits plus a
//! JavaScript-facing controller wrapper.

#[cfg(feature = "wasm")]
pub mod backend;

#[cfg(feature = "wasm")]
pub mod controller;

#[cfg(feature = "wasm")]
pub mod view;

#[cfg(feature = "wasm")]
pub use backend::{DocumentGestures, EventRelay, HtmlAudioBackend, RelayedEvent};

#[cfg(feature = "wasm")]
pub use controller::{WasmPlaybackController, WasmSubscription};

#[cfg(feature = "wasm")]
pub use view::{DomDragBinding, DomListener, DomPlayerView};
