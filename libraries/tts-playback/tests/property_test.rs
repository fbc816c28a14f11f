//! Property-based tests for store, drag tracks and formatting
//!
//! Uses proptest to verify invariants across many random inputs.

use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use tts_playback::{format_time, DragTrack, PointerEvent, Store, TimerManager, TrackBounds};

// ===== Helpers =====

fn arbitrary_updates() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec(("[a-d]", -3i64..3), 0..20)
}

fn counting_store(keys: &[&str]) -> (Store<i64>, Rc<RefCell<Vec<String>>>) {
    let store = Store::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    for &key in keys {
        let calls = Rc::clone(&calls);
        let name = key.to_string();
        store.subscribe(key, move |_: &i64| calls.borrow_mut().push(name.clone()));
    }
    (store, calls)
}

// ===== Property Tests =====

proptest! {
    /// Property: Re-applying the current state notifies nobody
    #[test]
    fn set_state_is_idempotent(updates in arbitrary_updates()) {
        let (store, calls) = counting_store(&["a", "b", "c", "d"]);
        store.set_state(updates.clone());
        calls.borrow_mut().clear();

        let snapshot: Vec<(String, i64)> = store.snapshot().into_iter().collect();
        let changed = store.set_state(snapshot);

        prop_assert!(changed.is_empty());
        prop_assert!(calls.borrow().is_empty());
    }

    /// Property: Each changed key notifies exactly once per update
    #[test]
    fn changed_keys_notify_once(updates in arbitrary_updates()) {
        let (store, calls) = counting_store(&["a", "b", "c", "d"]);

        let changed = store.set_state(updates);

        let mut unique = changed.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), changed.len());
        prop_assert_eq!(&*calls.borrow(), &changed);
    }

    /// Property: Last write wins for duplicate keys in one update
    #[test]
    fn last_write_wins(updates in arbitrary_updates()) {
        let store: Store<i64> = Store::new();
        store.set_state(updates.clone());

        for (key, _) in &updates {
            let last = updates.iter().rev().find(|(k, _)| k == key).map(|(_, v)| *v);
            prop_assert_eq!(store.get(key), last);
        }
    }

    /// Property: Drag fractions always land in [0, 1]
    #[test]
    fn drag_fraction_is_clamped(
        left in -1000.0f64..1000.0,
        width in -10.0f64..2000.0,
        xs in prop::collection::vec(-5000.0f64..5000.0, 1..20)
    ) {
        let emitted = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&emitted);
        let mut track = DragTrack::new(TrackBounds::new(left, width));
        track.on_change(move |fraction| sink.borrow_mut().push(fraction));

        track.on_engage_start(PointerEvent::at(left));
        for &x in &xs {
            track.on_pointer_move(PointerEvent::at(x));
        }
        track.on_engage_end();
        track.on_click(PointerEvent::at(xs[0]));

        prop_assert_eq!(emitted.borrow().len(), xs.len() + 1);
        prop_assert!(emitted.borrow().iter().all(|f| (0.0..=1.0).contains(f)));
    }

    /// Property: Moves after release never emit
    #[test]
    fn released_track_is_inert(xs in prop::collection::vec(-500.0f64..500.0, 1..20)) {
        let mut track = DragTrack::new(TrackBounds::new(0.0, 200.0));
        track.on_engage_start(PointerEvent::at(10.0));
        track.on_engage_end();

        for &x in &xs {
            prop_assert_eq!(track.on_pointer_move(PointerEvent::at(x)), None);
        }
    }

    /// Property: Formatted time round-trips whole seconds
    #[test]
    fn format_time_matches_whole_seconds(seconds in 0.0f64..36_000.0) {
        let text = format_time(seconds);
        let (minutes, secs) = text.split_once(':').unwrap();

        prop_assert_eq!(secs.len(), 2);
        let total = minutes.parse::<u64>().unwrap() * 60 + secs.parse::<u64>().unwrap();
        prop_assert_eq!(total, seconds.floor() as u64);
    }

    /// Property: Debounced keys fire once, at the last scheduled time
    #[test]
    fn debounce_fires_once(times in prop::collection::vec(0u64..10_000, 1..30), delay in 1u64..1_000) {
        let mut sorted = times;
        sorted.sort_unstable();
        let mut timers = TimerManager::new();
        for &t in &sorted {
            timers.debounce("search", t, delay);
        }

        let last = *sorted.last().unwrap();
        prop_assert!(timers.take_due(last + delay - 1).is_empty());
        prop_assert_eq!(timers.take_due(last + delay), vec!["search"]);
        prop_assert!(timers.take_due(u64::MAX).is_empty());
    }
}
