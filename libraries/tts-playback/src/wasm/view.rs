//! DOM player view and drag-track wiring

use crate::{
    backend::PlayerView,
    drag::{DragTrack, PointerEvent, TrackBounds},
};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Document, Event, EventTarget, HtmlElement, MouseEvent};

/// Element ids looked up by [`DomPlayerView::from_document`]
pub mod ids {
    pub const PLAY_ICON: &str = "playIcon";
    pub const PAUSE_ICON: &str = "pauseIcon";
    pub const PROGRESS_BAR: &str = "progressBar";
    pub const PROGRESS_FILL: &str = "progressBarFill";
    pub const PROGRESS_HANDLE: &str = "progressHandle";
    pub const CURRENT_TIME: &str = "currentTime";
    pub const DURATION: &str = "duration";
    pub const VOLUME_SLIDER: &str = "volumeSlider";
    pub const VOLUME_BAR: &str = "volumeBar";
    pub const VOLUME_HANDLE: &str = "volumeHandle";
    pub const RESULT_SECTION: &str = "resultSection";
    pub const PLAY_PAUSE_BUTTON: &str = "playPauseBtn";
    pub const PLAYBACK_SPEED: &str = "playbackSpeed";
}

const HIDDEN_CLASS: &str = "hidden";

pub(crate) fn element_by_id(document: &Document, id: &str) -> Option<HtmlElement> {
    document
        .get_element_by_id(id)
        .and_then(|element| element.dyn_into::<HtmlElement>().ok())
}

fn set_hidden(element: Option<&HtmlElement>, hidden: bool) {
    if let Some(element) = element {
        if let Err(error) = element
            .class_list()
            .toggle_with_force(HIDDEN_CLASS, hidden)
        {
            warn!(?error, "Failed to toggle visibility class");
        }
    }
}

fn set_style(element: Option<&HtmlElement>, property: &str, value: &str) {
    if let Some(element) = element {
        if let Err(error) = element.style().set_property(property, value) {
            warn!(property, ?error, "Failed to set style");
        }
    }
}

fn set_text(element: Option<&HtmlElement>, text: &str) {
    if let Some(element) = element {
        element.set_text_content(Some(text));
    }
}

/// [`PlayerView`] over the player's DOM elements; missing elements are skipped
#[derive(Default)]
pub struct DomPlayerView {
    play_icon: Option<HtmlElement>,
    pause_icon: Option<HtmlElement>,
    progress_fill: Option<HtmlElement>,
    progress_handle: Option<HtmlElement>,
    current_time: Option<HtmlElement>,
    duration: Option<HtmlElement>,
    volume_bar: Option<HtmlElement>,
    volume_handle: Option<HtmlElement>,
    result_section: Option<HtmlElement>,
}

impl DomPlayerView {
    pub fn from_document(document: &Document) -> Self {
        Self {
            play_icon: element_by_id(document, ids::PLAY_ICON),
            pause_icon: element_by_id(document, ids::PAUSE_ICON),
            progress_fill: element_by_id(document, ids::PROGRESS_FILL),
            progress_handle: element_by_id(document, ids::PROGRESS_HANDLE),
            current_time: element_by_id(document, ids::CURRENT_TIME),
            duration: element_by_id(document, ids::DURATION),
            volume_bar: element_by_id(document, ids::VOLUME_BAR),
            volume_handle: element_by_id(document, ids::VOLUME_HANDLE),
            result_section: element_by_id(document, ids::RESULT_SECTION),
        }
    }
}

impl PlayerView for DomPlayerView {
    fn set_playing_icon(&mut self, playing: bool) {
        set_hidden(self.play_icon.as_ref(), playing);
        set_hidden(self.pause_icon.as_ref(), !playing);
    }

    fn set_progress_percent(&mut self, percent: f64) {
        let value = format!("{percent}%");
        set_style(self.progress_fill.as_ref(), "width", &value);
        set_style(self.progress_handle.as_ref(), "left", &value);
    }

    fn set_current_time_text(&mut self, text: &str) {
        set_text(self.current_time.as_ref(), text);
    }

    fn set_duration_text(&mut self, text: &str) {
        set_text(self.duration.as_ref(), text);
    }

    fn set_volume_percent(&mut self, percent: f64) {
        let value = format!("{percent}%");
        set_style(self.volume_bar.as_ref(), "width", &value);
        set_style(self.volume_handle.as_ref(), "left", &value);
    }

    fn set_visible(&mut self, visible: bool) {
        set_hidden(self.result_section.as_ref(), !visible);
    }
}

type MouseListener = Closure<dyn FnMut(MouseEvent)>;

/// A [`DragTrack`] wired to a track element, its handle and the document
///
/// Listeners are detached on drop.
pub struct DomDragBinding {
    track: Rc<RefCell<DragTrack>>,
    listeners: Vec<(EventTarget, &'static str, MouseListener)>,
}

impl DomDragBinding {
    /// Wire `track_element` (click-to-set) and `handle` (press-and-drag)
    ///
    /// `on_fraction` receives every emitted fraction in `[0.0, 1.0]`.
    pub fn attach<F>(
        document: &Document,
        track_element: HtmlElement,
        handle: Option<HtmlElement>,
        on_fraction: F,
    ) -> Self
    where
        F: FnMut(f64) + 'static,
    {
        let bounds_source = track_element.clone();
        let mut drag = DragTrack::new(TrackBounds::default()).with_bounds_provider(move || {
            let rect = bounds_source.get_bounding_client_rect();
            Some(TrackBounds::new(rect.left(), rect.width()))
        });
        drag.on_change(on_fraction);
        let track = Rc::new(RefCell::new(drag));

        let mut binding = Self {
            track: Rc::clone(&track),
            listeners: Vec::new(),
        };

        binding.listen(EventTarget::from(track_element), "click", {
            let track = Rc::clone(&track);
            move |event| {
                if let Ok(mut track) = track.try_borrow_mut() {
                    track.on_click(pointer(&event));
                }
            }
        });

        if let Some(handle) = handle {
            binding.listen(EventTarget::from(handle), "mousedown", {
                let track = Rc::clone(&track);
                move |event| {
                    event.prevent_default();
                    event.stop_propagation();
                    if let Ok(mut track) = track.try_borrow_mut() {
                        track.on_engage_start(pointer(&event));
                    }
                }
            });
        }

        binding.listen(EventTarget::from(document.clone()), "mousemove", {
            let track = Rc::clone(&track);
            move |event| {
                if let Ok(mut track) = track.try_borrow_mut() {
                    track.on_pointer_move(pointer(&event));
                }
            }
        });

        binding.listen(EventTarget::from(document.clone()), "mouseup", move |_event| {
            if let Ok(mut track) = track.try_borrow_mut() {
                track.on_engage_end();
            }
        });

        binding
    }

    pub fn is_dragging(&self) -> bool {
        self.track.borrow().is_engaged()
    }

    fn listen<F>(&mut self, target: EventTarget, event_type: &'static str, callback: F)
    where
        F: FnMut(MouseEvent) + 'static,
    {
        let listener = Closure::wrap(Box::new(callback) as Box<dyn FnMut(MouseEvent)>);
        if let Err(error) =
            target.add_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref())
        {
            warn!(event_type, ?error, "Failed to attach drag listener");
        }
        self.listeners.push((target, event_type, listener));
    }
}

impl Drop for DomDragBinding {
    fn drop(&mut self) {
        for (target, event_type, listener) in self.listeners.drain(..) {
            let _ = target
                .remove_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref());
        }
    }
}

/// A single element listener, removed on drop
pub struct DomListener {
    target: EventTarget,
    event_type: &'static str,
    listener: Closure<dyn FnMut(Event)>,
}

impl DomListener {
    pub fn attach<F>(target: EventTarget, event_type: &'static str, callback: F) -> Self
    where
        F: FnMut(Event) + 'static,
    {
        let listener = Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>);
        if let Err(error) =
            target.add_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref())
        {
            warn!(event_type, ?error, "Failed to attach control listener");
        }
        Self {
            target,
            event_type,
            listener,
        }
    }
}

impl Drop for DomListener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback(
            self.event_type,
            self.listener.as_ref().unchecked_ref(),
        );
    }
}

/// Playback rate chosen in the speed selector (`"1.5"` -> 1.5)
pub(crate) fn parse_rate(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|rate| rate.is_finite() && *rate > 0.0)
}

fn pointer(event: &MouseEvent) -> PointerEvent {
    PointerEvent::at(f64::from(event.client_x()))
}
