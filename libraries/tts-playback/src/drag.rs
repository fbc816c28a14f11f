//! Pointer-drag-to-fraction mapping for linear controls
//!
//! One `DragTrack` backs each linear control (seek scrubber, volume slider).
//! Move and up listeners live at the document level for the lifetime of the
//! control so a drag can continue outside the element, which is why every
//! move is checked against `engaged`.

use serde::{Deserialize, Serialize};

/// Horizontal geometry of a track element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackBounds {
    pub left: f64,
    pub width: f64,
}

impl TrackBounds {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Map a pointer X coordinate onto this track, clamped to 0.0-1.0
    ///
    /// A zero (or otherwise unusable) width yields 0.0.
    pub fn fraction_at(&self, x: f64) -> f64 {
        if !(self.width.is_finite() && self.width > 0.0) || !x.is_finite() {
            return 0.0;
        }
        ((x - self.left) / self.width).clamp(0.0, 1.0)
    }
}

/// Pointer position, in the same coordinate space as [`TrackBounds`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub client_x: f64,
}

impl PointerEvent {
    pub fn at(client_x: f64) -> Self {
        Self { client_x }
    }
}

type BoundsProvider = Box<dyn Fn() -> Option<TrackBounds>>;
type ChangeHandler = Box<dyn FnMut(f64)>;

/// Converts click and press-and-drag gestures into fractions
pub struct DragTrack {
    engaged: bool,
    bounds: TrackBounds,
    bounds_provider: Option<BoundsProvider>,
    on_change: Option<ChangeHandler>,
}

impl Default for DragTrack {
    fn default() -> Self {
        Self::new(TrackBounds::default())
    }
}

impl DragTrack {
    /// Create a track with fixed initial bounds
    pub fn new(bounds: TrackBounds) -> Self {
        Self {
            engaged: false,
            bounds,
            bounds_provider: None,
            on_change: None,
        }
    }

    /// Sample bounds from `provider` at drag start and on click
    ///
    /// The provider typically reads the element's bounding rectangle. A
    /// `None` result keeps the last known bounds.
    pub fn with_bounds_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Option<TrackBounds> + 'static,
    {
        self.bounds_provider = Some(Box::new(provider));
        self
    }

    /// Register the fraction callback (replaces any previous one)
    pub fn on_change<F>(&mut self, handler: F)
    where
        F: FnMut(f64) + 'static,
    {
        self.on_change = Some(Box::new(handler));
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn bounds(&self) -> TrackBounds {
        self.bounds
    }

    /// Pointer pressed on the handle
    pub fn on_engage_start(&mut self, _event: PointerEvent) {
        self.refresh_bounds();
        self.engaged = true;
    }

    /// Pointer moved anywhere in the document
    ///
    /// Returns the emitted fraction, or `None` when not dragging.
    pub fn on_pointer_move(&mut self, event: PointerEvent) -> Option<f64> {
        if !self.engaged {
            return None;
        }
        Some(self.emit(event))
    }

    /// Pointer released anywhere in the document
    pub fn on_engage_end(&mut self) {
        self.engaged = false;
    }

    /// Click on the track (click-to-set, no prior engagement needed)
    pub fn on_click(&mut self, event: PointerEvent) -> f64 {
        self.refresh_bounds();
        self.emit(event)
    }

    /// Track element was resized
    pub fn on_resize(&mut self, bounds: TrackBounds) {
        self.bounds = bounds;
    }

    fn refresh_bounds(&mut self) {
        if let Some(bounds) = self.bounds_provider.as_ref().and_then(|provider| provider()) {
            self.bounds = bounds;
        }
    }

    fn emit(&mut self, event: PointerEvent) -> f64 {
        let fraction = self.bounds.fraction_at(event.client_x);
        if let Some(handler) = self.on_change.as_mut() {
            handler(fraction);
        }
        fraction
    }
}
