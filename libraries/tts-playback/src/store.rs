//! Keyed publish/subscribe state container
//!
//! The store is the only channel through which independent UI fragments
//! (playback controls, character counter, history panel, mode toggle)
//! observe each other. Notifications are per key and only fire when a
//! value actually changes.
//!
//! `Store` is a cheap, cloneable handle; clones share state. It is meant
//! for a single-threaded event loop, so callbacks may freely read, write,
//! subscribe or unsubscribe on the same store while being notified.
//! Writes made from inside a callback are queued and delivered after the
//! current notification pass, so every subscriber sees changes in order.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Well-known keys shared by the playback controller and UI fragments
pub mod keys {
    pub const CURRENT_AUDIO: &str = "currentAudio";
    pub const IS_PLAYING: &str = "isPlaying";
    pub const IS_LOADING: &str = "isLoading";
    pub const IS_SSML_MODE: &str = "isSSMLMode";
    pub const VOICES: &str = "voices";
    pub const CURRENT_VOICE: &str = "currentVoice";
    pub const CURRENT_STYLE: &str = "currentStyle";
    pub const HISTORY: &str = "history";
    pub const FORM_DATA: &str = "formData";
}

type Callback<V> = Rc<RefCell<dyn FnMut(&V)>>;

struct Listener<V> {
    id: u64,
    callback: Callback<V>,
}

struct Inner<V> {
    state: RefCell<HashMap<String, V>>,
    listeners: RefCell<HashMap<String, Vec<Listener<V>>>>,
    next_id: Cell<u64>,
    queue: RefCell<VecDeque<(String, V)>>,
    notifying: Cell<bool>,
}

impl<V> Inner<V> {
    fn is_registered(&self, key: &str, id: u64) -> bool {
        self.listeners
            .borrow()
            .get(key)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }

    fn remove(&self, key: &str, id: u64) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(key);
        }
        removed
    }
}

/// Shared keyed state with change notifications
pub struct Store<V> {
    inner: Rc<Inner<V>>,
}

impl<V> Clone for Store<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: Clone + PartialEq + 'static> Default for Store<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + PartialEq + 'static> Store<V> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(HashMap::new()),
                listeners: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
                queue: RefCell::new(VecDeque::new()),
                notifying: Cell::new(false),
            }),
        }
    }

    /// Create a store seeded with initial values (no notifications)
    pub fn with_state<I, K>(initial: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let store = Self::new();
        store
            .inner
            .state
            .borrow_mut()
            .extend(initial.into_iter().map(|(k, v)| (k.into(), v)));
        store
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.state.borrow().get(key).cloned()
    }

    /// Copy of the entire mapping
    pub fn snapshot(&self) -> HashMap<String, V> {
        self.inner.state.borrow().clone()
    }

    /// Apply a partial update and notify subscribers of changed keys
    ///
    /// Keys are processed in input order. Keys whose new value equals the
    /// current one are skipped. After all assignments, each changed key's
    /// subscribers are notified exactly once, in input order, with the value
    /// written here. Called from inside a callback, delivery waits until the
    /// running notification pass has finished.
    ///
    /// Returns the changed keys.
    pub fn set_state<I, K>(&self, updates: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let mut changed: Vec<(String, V)> = Vec::new();

        {
            let mut state = self.inner.state.borrow_mut();
            for (key, value) in updates {
                let key = key.into();
                if state.get(&key) == Some(&value) {
                    continue;
                }
                state.insert(key.clone(), value.clone());
                match changed.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => entry.1 = value,
                    None => changed.push((key, value)),
                }
            }
        }

        let keys = changed.iter().map(|(key, _)| key.clone()).collect();
        self.inner.queue.borrow_mut().extend(changed);
        self.drain();
        keys
    }

    /// Set a single key; returns whether it changed
    pub fn set(&self, key: impl Into<String>, value: V) -> bool {
        !self.set_state([(key.into(), value)]).is_empty()
    }

    /// Register `callback` for changes to `key`
    pub fn subscribe<F>(&self, key: impl Into<String>, callback: F) -> Subscription<V>
    where
        F: FnMut(&V) + 'static,
    {
        let key = key.into();
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let callback: Callback<V> = Rc::new(RefCell::new(callback));
        self.inner
            .listeners
            .borrow_mut()
            .entry(key.clone())
            .or_default()
            .push(Listener { id, callback });

        Subscription {
            store: Rc::downgrade(&self.inner),
            key,
            id,
        }
    }

    /// Number of callbacks registered under `key`
    pub fn listener_count(&self, key: &str) -> usize {
        self.inner.listeners.borrow().get(key).map_or(0, Vec::len)
    }

    /// Clear all state and all subscriptions
    pub fn reset(&self) {
        self.inner.state.borrow_mut().clear();
        self.inner.listeners.borrow_mut().clear();
        self.inner.queue.borrow_mut().clear();
        debug!("Store reset");
    }

    /// Deliver queued changes unless an outer call is already doing so
    fn drain(&self) {
        if self.inner.notifying.replace(true) {
            return;
        }
        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            let Some((key, value)) = next else {
                break;
            };
            self.notify(&key, &value);
        }
        self.inner.notifying.set(false);
    }

    /// Every subscriber sees `value`, even if an earlier one rewrote the key
    fn notify(&self, key: &str, value: &V) {
        // Snapshot so callbacks can subscribe/unsubscribe while we iterate
        let pending: Vec<(u64, Callback<V>)> = match self.inner.listeners.borrow().get(key) {
            Some(list) => list
                .iter()
                .map(|l| (l.id, Rc::clone(&l.callback)))
                .collect(),
            None => return,
        };

        for (id, callback) in pending {
            // Removed by an earlier callback in this pass (or by reset)
            if !self.inner.is_registered(key, id) {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut f) => (*f)(value),
                Err(_) => warn!(key, "Skipping re-entrant store notification"),
            }
        }
    }
}

/// Handle returned by [`Store::subscribe`]
///
/// Dropping the handle does not unsubscribe.
pub struct Subscription<V> {
    store: Weak<Inner<V>>,
    key: String,
    id: u64,
}

impl<V> Subscription<V> {
    /// Remove exactly this callback; other callbacks on the key are kept
    ///
    /// Returns false if it was already removed (or the store is gone).
    pub fn unsubscribe(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|inner| inner.remove(&self.key, self.id))
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
