//! WASM-compatible PlaybackController wrapper

use super::backend::{DocumentGestures, EventRelay, HtmlAudioBackend, RelayedEvent};
use super::view::{element_by_id, ids, parse_rate, DomDragBinding, DomListener, DomPlayerView};
use crate::{
    PlaybackConfig, PlaybackController, PlaybackError, SourceRef, Store, Subscription,
    TransportState,
};
use js_sys::Function;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::warn;
use wasm_bindgen::prelude::*;
use web_sys::{Document, EventTarget, HtmlAudioElement};

type ErrorCallback = Rc<RefCell<Option<Function>>>;

fn report(callback: &ErrorCallback, error: &PlaybackError) -> JsValue {
    let message = error.to_string();
    if let Some(ref cb) = *callback.borrow() {
        cb.call1(&JsValue::NULL, &JsValue::from_str(&message)).ok();
    }
    JsValue::from_str(&message)
}

/// Handle returned by [`WasmPlaybackController::subscribe`]
#[wasm_bindgen]
pub struct WasmSubscription {
    inner: Subscription<Value>,
}

#[wasm_bindgen]
impl WasmSubscription {
    /// Detach the callback; repeated calls are no-ops
    pub fn unsubscribe(&self) -> bool {
        self.inner.unsubscribe()
    }
}

/// JavaScript-facing playback controller bound to the page's audio element
#[wasm_bindgen]
pub struct WasmPlaybackController {
    inner: Rc<RefCell<PlaybackController>>,
    store: Store<Value>,
    document: Document,
    on_error: ErrorCallback,
    drag_bindings: Vec<DomDragBinding>,
    control_listeners: Vec<DomListener>,
}

#[wasm_bindgen]
impl WasmPlaybackController {
    /// Bind to `audio` and the player elements of the current document
    #[wasm_bindgen(constructor)]
    pub fn new(audio: HtmlAudioElement) -> Result<WasmPlaybackController, JsValue> {
        // Enable panic hooks for better error messages in console
        console_error_panic_hook::set_once();

        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("No document available"))?;

        let relay = EventRelay::default();
        let store = Store::new();
        let on_error: ErrorCallback = Rc::new(RefCell::new(None));

        let controller = PlaybackController::new(
            PlaybackConfig::default(),
            Box::new(HtmlAudioBackend::new(audio, relay.clone())),
            Box::new(DocumentGestures::new(document.clone(), relay.clone())),
            store.clone(),
        )
        .map_err(|e| report(&on_error, &e))?
        .with_view(Box::new(DomPlayerView::from_document(&document)));

        let inner = Rc::new(RefCell::new(controller));
        relay.connect(event_handler(Rc::downgrade(&inner), Rc::clone(&on_error)));

        Ok(Self {
            inner,
            store,
            document,
            on_error,
            drag_bindings: Vec::new(),
            control_listeners: Vec::new(),
        })
    }

    // ===== Playback Control =====

    /// Load a new audio URL and try to autoplay it
    pub fn load(&mut self, url: String) {
        self.inner.borrow_mut().load(SourceRef::new(url));
    }

    /// Play when paused, pause when playing
    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&mut self) -> Result<(), JsValue> {
        let result = self.inner.borrow_mut().toggle_play();
        result.map(|_| ()).map_err(|e| report(&self.on_error, &e))
    }

    pub fn play(&mut self) -> Result<(), JsValue> {
        let result = self.inner.borrow_mut().play();
        result.map(|_| ()).map_err(|e| report(&self.on_error, &e))
    }

    pub fn pause(&mut self) {
        self.inner.borrow_mut().pause();
    }

    pub fn stop(&mut self) {
        self.inner.borrow_mut().stop();
    }

    /// Release the audio and hide the player
    pub fn destroy(&mut self) {
        self.drag_bindings.clear();
        self.control_listeners.clear();
        self.inner.borrow_mut().destroy();
    }

    // ===== Seek / Volume / Rate =====

    /// Seek to a position in seconds
    pub fn seek(&mut self, seconds: f64) -> bool {
        self.inner.borrow_mut().seek(seconds)
    }

    /// Seek to a fraction (0.0-1.0) of the duration
    #[wasm_bindgen(js_name = seekFraction)]
    pub fn seek_fraction(&mut self, fraction: f64) -> bool {
        self.inner.borrow_mut().seek_fraction(fraction)
    }

    /// Set volume (0.0-1.0), returns the applied value
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, volume: f64) -> f64 {
        self.inner.borrow_mut().set_volume(volume)
    }

    #[wasm_bindgen(js_name = getVolume)]
    pub fn get_volume(&self) -> f64 {
        self.inner.borrow().volume()
    }

    #[wasm_bindgen(js_name = setPlaybackRate)]
    pub fn set_playback_rate(&mut self, rate: f64) -> f64 {
        self.inner.borrow_mut().set_playback_rate(rate)
    }

    #[wasm_bindgen(js_name = getPlaybackRate)]
    pub fn get_playback_rate(&self) -> f64 {
        self.inner.borrow().playback_rate()
    }

    /// Wire the player controls: play/pause button, speed selector, and
    /// click and drag on the progress bar and volume slider
    ///
    /// Missing elements are skipped. Calling again replaces earlier wiring.
    #[wasm_bindgen(js_name = bindControls)]
    pub fn bind_controls(&mut self) {
        self.drag_bindings.clear();
        self.control_listeners.clear();

        if let Some(button) = element_by_id(&self.document, ids::PLAY_PAUSE_BUTTON) {
            let controller = Rc::downgrade(&self.inner);
            let on_error = Rc::clone(&self.on_error);
            self.control_listeners.push(DomListener::attach(
                EventTarget::from(button),
                "click",
                move |_event| {
                    let Some(strong) = controller.upgrade() else {
                        return;
                    };
                    let Ok(mut guard) = strong.try_borrow_mut() else {
                        return;
                    };
                    let result = guard.toggle_play();
                    drop(guard);
                    if let Err(error) = result {
                        report(&on_error, &error);
                    }
                },
            ));
        }

        if let Some(select) = element_by_id(&self.document, ids::PLAYBACK_SPEED) {
            let mut apply = with_controller(Rc::downgrade(&self.inner), |c, rate| {
                c.set_playback_rate(rate);
            });
            let source = select.clone();
            self.control_listeners.push(DomListener::attach(
                EventTarget::from(select),
                "change",
                move |_event| {
                    let value = js_sys::Reflect::get(&source, &JsValue::from_str("value"))
                        .ok()
                        .and_then(|value| value.as_string());
                    match value.as_deref().and_then(parse_rate) {
                        Some(rate) => apply(rate),
                        None => warn!(?value, "Ignoring unreadable playback speed"),
                    }
                },
            ));
        }

        let controller = Rc::downgrade(&self.inner);
        if let Some(track) = element_by_id(&self.document, ids::PROGRESS_BAR) {
            self.drag_bindings.push(DomDragBinding::attach(
                &self.document,
                track,
                element_by_id(&self.document, ids::PROGRESS_HANDLE),
                with_controller(controller.clone(), |c, fraction| {
                    c.seek_fraction(fraction);
                }),
            ));
        }

        if let Some(track) = element_by_id(&self.document, ids::VOLUME_SLIDER) {
            self.drag_bindings.push(DomDragBinding::attach(
                &self.document,
                track,
                element_by_id(&self.document, ids::VOLUME_HANDLE),
                with_controller(controller, |c, fraction| {
                    c.set_volume(fraction);
                }),
            ));
        }
    }

    // ===== State Queries =====

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.inner.borrow().is_playing()
    }

    /// Transport state as a string
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        match self.inner.borrow().transport() {
            TransportState::Idle => "idle",
            TransportState::Loading => "loading",
            TransportState::Playing => "playing",
            TransportState::Paused => "paused",
            TransportState::Ended => "ended",
        }
        .to_string()
    }

    /// Position in seconds
    #[wasm_bindgen(js_name = getPosition)]
    pub fn get_position(&self) -> f64 {
        self.inner.borrow().session().map_or(0.0, |s| s.position())
    }

    /// Duration in seconds (NaN when unknown)
    #[wasm_bindgen(js_name = getDuration)]
    pub fn get_duration(&self) -> f64 {
        self.inner
            .borrow()
            .session()
            .and_then(|s| s.duration())
            .unwrap_or(f64::NAN)
    }

    // ===== Store =====

    /// Read a store key as a JS value (undefined when absent)
    #[wasm_bindgen(js_name = getStoreValue)]
    pub fn get_store_value(&self, key: &str) -> Result<JsValue, JsValue> {
        match self.store.get(key) {
            Some(value) => serde_wasm_bindgen::to_value(&value).map_err(JsValue::from),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Write a store key; subscribers run if the value changed
    #[wasm_bindgen(js_name = setStoreValue)]
    pub fn set_store_value(&self, key: String, value: JsValue) -> Result<bool, JsValue> {
        let value: Value = serde_wasm_bindgen::from_value(value).map_err(JsValue::from)?;
        Ok(self.store.set(key, value))
    }

    /// Call `callback(value)` whenever `key` changes
    ///
    /// Callbacks run synchronously, possibly inside a controller operation,
    /// so they must not call back into this controller.
    pub fn subscribe(&self, key: String, callback: Function) -> WasmSubscription {
        let inner = self.store.subscribe(key, move |value: &Value| {
            match serde_wasm_bindgen::to_value(value) {
                Ok(js_value) => {
                    callback.call1(&JsValue::NULL, &js_value).ok();
                }
                Err(error) => warn!(%error, "Failed to convert store value"),
            }
        });
        WasmSubscription { inner }
    }

    // ===== Event Callbacks =====

    /// Register error callback
    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&mut self, callback: Function) {
        *self.on_error.borrow_mut() = Some(callback);
    }
}

fn event_handler(
    controller: Weak<RefCell<PlaybackController>>,
    on_error: ErrorCallback,
) -> impl Fn(RelayedEvent) {
    move |event| {
        let Some(strong) = controller.upgrade() else {
            return;
        };
        let Ok(mut guard) = strong.try_borrow_mut() else {
            warn!(?event, "Controller busy, dropping event");
            return;
        };
        let result = match event {
            RelayedEvent::Media(event) => guard.handle_event(event),
            RelayedEvent::Gesture { arm, kind } => Ok(guard.handle_gesture(arm, kind)),
        };
        drop(guard);

        if let Err(error) = result {
            report(&on_error, &error);
        }
    }
}

fn with_controller<F>(
    controller: Weak<RefCell<PlaybackController>>,
    mut action: F,
) -> impl FnMut(f64)
where
    F: FnMut(&mut PlaybackController, f64) + 'static,
{
    move |fraction| {
        let Some(strong) = controller.upgrade() else {
            return;
        };
        if let Ok(mut guard) = strong.try_borrow_mut() {
            action(&mut guard, fraction);
        }
    }
}
