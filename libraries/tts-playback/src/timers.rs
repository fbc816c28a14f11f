//! Debounce and throttle scheduling
//!
//! Time is passed in explicitly (milliseconds since any fixed origin), so the
//! host decides where "now" comes from: `Date.now()` in the browser, a fake
//! clock in tests. The host polls [`TimerManager::take_due`] from its timer
//! callback and runs whatever comes back.

use std::collections::HashMap;
use std::hash::Hash;

/// Named debounce/throttle timers
///
/// Each key has at most one pending debounced invocation: scheduling again
/// replaces it, so only the most recent one can fire.
#[derive(Debug, Clone)]
pub struct TimerManager<K> {
    pending: HashMap<K, u64>,
    last_passed: HashMap<K, u64>,
}

impl<K: Eq + Hash + Clone> Default for TimerManager<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> TimerManager<K> {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            last_passed: HashMap::new(),
        }
    }

    /// Schedule `key` to fire `delay_ms` after `now_ms`, replacing any pending run
    ///
    /// Returns true if a pending invocation was replaced.
    pub fn debounce(&mut self, key: K, now_ms: u64, delay_ms: u64) -> bool {
        self.pending
            .insert(key, now_ms.saturating_add(delay_ms))
            .is_some()
    }

    /// Whether `key` may run now, at most once per `interval_ms`
    ///
    /// The first call for a key always passes.
    pub fn throttle(&mut self, key: K, now_ms: u64, interval_ms: u64) -> bool {
        let allowed = match self.last_passed.get(&key) {
            None => true,
            Some(&last) => now_ms.saturating_sub(last) >= interval_ms,
        };
        if allowed {
            self.last_passed.insert(key, now_ms);
        }
        allowed
    }

    /// Drop the pending invocation for `key`
    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Earliest due time among pending invocations
    pub fn next_due(&self) -> Option<u64> {
        self.pending.values().copied().min()
    }

    /// Remove and return every key due at `now_ms`, earliest first
    pub fn take_due(&mut self, now_ms: u64) -> Vec<K> {
        let mut due: Vec<(u64, K)> = self
            .pending
            .iter()
            .filter(|&(_, &at)| at <= now_ms)
            .map(|(key, &at)| (at, key.clone()))
            .collect();
        due.sort_by_key(|(at, _)| *at);

        for (_, key) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    /// Drop every pending invocation and throttle window
    pub fn clear(&mut self) {
        self.pending.clear();
        self.last_passed.clear();
    }
}
