//! `<audio>` element and document listeners as controller collaborators
//!
//! Element callbacks never call into the controller directly. They go
//! through an [`EventRelay`], which re-dispatches on a microtask so that a
//! listener firing while the controller is mid-operation cannot re-enter it.

use crate::{
    backend::{GestureTarget, MediaBackend, MediaEvent},
    error::{PlayRejection, RejectionKind},
    types::{ArmId, GestureKind, PlayTicket, SourceRef},
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, DomException, Event, HtmlAudioElement, Url};

type Listener = Closure<dyn FnMut(Event)>;

/// Something the page reported to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum RelayedEvent {
    Media(MediaEvent),
    Gesture { arm: ArmId, kind: GestureKind },
}

/// Shared hand-off point between DOM callbacks and the controller
#[derive(Clone, Default)]
pub struct EventRelay {
    handler: Rc<RefCell<Option<Box<dyn Fn(RelayedEvent)>>>>,
}

impl EventRelay {
    pub fn connect<F>(&self, handler: F)
    where
        F: Fn(RelayedEvent) + 'static,
    {
        *self.handler.borrow_mut() = Some(Box::new(handler));
    }

    /// Deliver on the next microtask
    pub fn emit(&self, event: RelayedEvent) {
        let relay = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            relay.dispatch(event);
        });
    }

    /// Deliver now; only call from outside the controller
    pub fn dispatch(&self, event: RelayedEvent) {
        match self.handler.borrow().as_ref() {
            Some(handler) => handler(event),
            None => debug!(?event, "No handler connected, dropping event"),
        }
    }
}

/// Map a rejected `play()` promise to a [`PlayRejection`]
pub fn rejection_from_js(error: &JsValue) -> PlayRejection {
    match error.dyn_ref::<DomException>() {
        Some(exception) => {
            let kind = match exception.name().as_str() {
                "NotAllowedError" => RejectionKind::PolicyBlocked,
                "AbortError" => RejectionKind::Aborted,
                "NotSupportedError" => RejectionKind::NotSupported,
                _ => RejectionKind::Other,
            };
            PlayRejection::new(kind, exception.message())
        }
        None => PlayRejection::new(
            RejectionKind::Other,
            error.as_string().unwrap_or_else(|| format!("{error:?}")),
        ),
    }
}

/// [`MediaBackend`] over an `HTMLAudioElement`
pub struct HtmlAudioBackend {
    audio: HtmlAudioElement,
    relay: EventRelay,
    next_ticket: u64,
    last_released: Option<String>,
    listeners: Vec<(&'static str, Listener)>,
}

impl HtmlAudioBackend {
    /// Wrap `audio` and forward its media events through `relay`
    pub fn new(audio: HtmlAudioElement, relay: EventRelay) -> Self {
        let mut listeners = Vec::new();
        for (event_type, media_event) in [
            ("loadedmetadata", MediaEvent::MetadataLoaded),
            ("timeupdate", MediaEvent::TimeUpdate),
            ("ended", MediaEvent::Ended),
        ] {
            let relay = relay.clone();
            let listener = Closure::wrap(Box::new(move |_event: Event| {
                relay.emit(RelayedEvent::Media(media_event.clone()));
            }) as Box<dyn FnMut(Event)>);

            if let Err(error) = audio
                .add_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref())
            {
                warn!(event_type, ?error, "Failed to attach media listener");
            }
            listeners.push((event_type, listener));
        }

        Self {
            audio,
            relay,
            next_ticket: 0,
            last_released: None,
            listeners,
        }
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.audio
    }
}

/// Record `locator` as the latest released handle
///
/// Returns false for a repeat release of the same handle. Only the latest
/// one is remembered; older handles have been superseded and are never
/// released again.
fn mark_released(last: &mut Option<String>, locator: &str) -> bool {
    if last.as_deref() == Some(locator) {
        return false;
    }
    *last = Some(locator.to_owned());
    true
}

impl MediaBackend for HtmlAudioBackend {
    fn set_source(&mut self, source: &SourceRef) {
        if self.last_released.as_deref() == Some(source.as_str()) {
            self.last_released = None;
        }
        self.audio.set_src(source.as_str());
        self.audio.load();
    }

    fn clear_source(&mut self) {
        if let Err(error) = self.audio.remove_attribute("src") {
            warn!(?error, "Failed to detach audio source");
        }
        self.audio.load();
    }

    fn release_source(&mut self, source: &SourceRef) {
        if !mark_released(&mut self.last_released, source.as_str()) {
            return;
        }
        if !source.as_str().starts_with("blob:") {
            return;
        }
        if let Err(error) = Url::revoke_object_url(source.as_str()) {
            debug!(%source, ?error, "Object URL revoke failed");
        }
    }

    fn request_play(&mut self) -> PlayTicket {
        self.next_ticket += 1;
        let ticket = PlayTicket(self.next_ticket);
        let relay = self.relay.clone();

        match self.audio.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                let result = JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|error| rejection_from_js(&error));
                relay.dispatch(RelayedEvent::Media(MediaEvent::PlayResolved { ticket, result }));
            }),
            Err(error) => relay.emit(RelayedEvent::Media(MediaEvent::PlayResolved {
                ticket,
                result: Err(rejection_from_js(&error)),
            })),
        }
        ticket
    }

    fn pause(&mut self) {
        if let Err(error) = self.audio.pause() {
            warn!(?error, "pause() threw");
        }
    }

    fn current_time(&self) -> f64 {
        self.audio.current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.audio.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.audio.duration()
    }

    fn set_volume(&mut self, volume: f64) {
        self.audio.set_volume(volume);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.audio.set_playback_rate(rate);
    }
}

impl Drop for HtmlAudioBackend {
    fn drop(&mut self) {
        for (event_type, listener) in self.listeners.drain(..) {
            let _ = self
                .audio
                .remove_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref());
        }
    }
}

/// [`GestureTarget`] attaching listeners to the document
pub struct DocumentGestures {
    document: Document,
    relay: EventRelay,
    armed: HashMap<ArmId, Vec<(&'static str, Listener)>>,
}

impl DocumentGestures {
    pub fn new(document: Document, relay: EventRelay) -> Self {
        Self {
            document,
            relay,
            armed: HashMap::new(),
        }
    }

    /// Number of listener sets currently attached
    pub fn armed_sets(&self) -> usize {
        self.armed.len()
    }
}

impl GestureTarget for DocumentGestures {
    fn arm(&mut self, arm: ArmId, kinds: &[GestureKind]) {
        self.disarm(arm);

        let mut listeners = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            let relay = self.relay.clone();
            let listener = Closure::wrap(Box::new(move |_event: Event| {
                relay.emit(RelayedEvent::Gesture { arm, kind });
            }) as Box<dyn FnMut(Event)>);

            let event_type = kind.event_type();
            if let Err(error) = self
                .document
                .add_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref())
            {
                warn!(event_type, ?error, "Failed to attach gesture listener");
            }
            listeners.push((event_type, listener));
        }

        debug!(arm = arm.0, count = listeners.len(), "Gesture listeners attached");
        self.armed.insert(arm, listeners);
    }

    fn disarm(&mut self, arm: ArmId) {
        let Some(listeners) = self.armed.remove(&arm) else {
            return;
        };
        for (event_type, listener) in listeners {
            let _ = self
                .document
                .remove_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref());
        }
        debug!(arm = arm.0, "Gesture listeners removed");
    }
}

impl Drop for DocumentGestures {
    fn drop(&mut self) {
        let arms: Vec<ArmId> = self.armed.keys().copied().collect();
        for arm in arms {
            self.disarm(arm);
        }
    }
}
