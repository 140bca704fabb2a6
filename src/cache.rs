//! The network-model cache: a secondary utility, built on the planner
//! core, that memoises a scalar cost by reachability map with
//! at-most-once-in-flight semantics under concurrent access.
//!
//! Modelled on the "claim a slot, compute outside the lock, wake waiters"
//! shape of `once_cell::sync::OnceCell::get_or_try_init` — the same pattern
//! `cargo-guppy`'s feature graph uses for its own lazily-computed SCCs
//! (`guppy/src/graph/feature/build.rs`) — generalised here from a single
//! cell to a keyed map: the first caller for a given key runs `compute`,
//! concurrent callers for that same key block on its result instead of
//! duplicating the work, and calls for other keys proceed independently.
//! `once_cell` itself only covers a single slot, so this module is built
//! directly on `std::sync::{Mutex, Condvar}` rather than taking a
//! dependency on it for a pattern it doesn't actually provide here.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use crate::bitset::GoalSet;

/// A canonicalised `{port -> goal-subset}` reachability map: entries with
/// an empty subset are dropped, masks are truncated to `degree` bits, and
/// the remaining `(port, mask)` pairs are sorted by port so that two maps
/// describing the same reachability hash and compare equal regardless of
/// the order their entries were built in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReachabilityKey(Vec<(usize, u64)>);

impl ReachabilityKey {
    /// Build a key from `(port, goal_subset)` pairs over a function of the
    /// given `degree`.
    pub fn new(map: &[(usize, GoalSet)], degree: usize) -> Self {
        let truncate = if degree >= 64 {
            u64::MAX
        } else {
            (1u64 << degree) - 1
        };
        let mut entries: Vec<(usize, u64)> = map
            .iter()
            .filter_map(|(port, set)| {
                let bits = set.as_u64().unwrap_or(0) & truncate;
                (bits != 0).then_some((*port, bits))
            })
            .collect();
        entries.sort_unstable_by_key(|(port, _)| *port);
        entries.dedup_by_key(|(port, _)| *port);
        Self(entries)
    }
}

/// The shared signal a waiter blocks on until the in-flight computation for
/// its key finishes.
type Pending = Arc<(Mutex<Option<f64>>, Condvar)>;

enum Slot {
    Computing(Pending),
    Done(f64),
}

/// Memoises `evaluate` by [`ReachabilityKey`].
pub struct NetworkModelCache {
    slots: Mutex<HashMap<ReachabilityKey, Slot>>,
}

impl NetworkModelCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, computing it with `compute` if
    /// this is the first call to see `key`. Concurrent calls for the same
    /// key block on that single computation; calls for other keys are
    /// unaffected.
    pub fn evaluate(&self, key: ReachabilityKey, compute: impl FnOnce() -> f64) -> f64 {
        let pending = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            match slots.entry(key.clone()) {
                Entry::Occupied(occ) => match occ.get() {
                    Slot::Done(v) => return *v,
                    Slot::Computing(pending) => Some(Arc::clone(pending)),
                },
                Entry::Vacant(vac) => {
                    vac.insert(Slot::Computing(Arc::new((Mutex::new(None), Condvar::new()))));
                    None
                }
            }
        };

        if let Some(pending) = pending {
            let (lock, ready) = &*pending;
            let mut value = lock.lock().unwrap_or_else(|e| e.into_inner());
            while value.is_none() {
                value = ready.wait(value).unwrap_or_else(|e| e.into_inner());
            }
            return value.expect("the condition variable only wakes after the value is set");
        }

        let value = compute();

        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(Slot::Computing(pending)) = slots.insert(key, Slot::Done(value)) {
            let (lock, ready) = &*pending;
            *lock.lock().unwrap_or_else(|e| e.into_inner()) = Some(value);
            ready.notify_all();
        }
        value
    }
}

impl Default for NetworkModelCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn repeated_key_computes_once() {
        let cache = NetworkModelCache::new();
        let calls = Cell::new(0u32);
        let key = ReachabilityKey::new(&[(0, GoalSet::from_bits(0b01, 2))], 2);

        let a = cache.evaluate(key.clone(), || {
            calls.set(calls.get() + 1);
            1.5
        });
        let b = cache.evaluate(key, || {
            calls.set(calls.get() + 1);
            9.9
        });

        assert_eq!(a, 1.5);
        assert_eq!(b, 1.5);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn distinct_keys_are_independent() {
        let cache = NetworkModelCache::new();
        let key_a = ReachabilityKey::new(&[(0, GoalSet::from_bits(0b01, 2))], 2);
        let key_b = ReachabilityKey::new(&[(0, GoalSet::from_bits(0b10, 2))], 2);

        let a = cache.evaluate(key_a, || 1.0);
        let b = cache.evaluate(key_b, || 2.0);
        assert_eq!(a, 1.0);
        assert_eq!(b, 2.0);
    }

    #[test]
    fn canonicalisation_drops_empty_subsets_and_sorts_by_port() {
        let k1 = ReachabilityKey::new(
            &[
                (2, GoalSet::from_bits(0b01, 2)),
                (0, GoalSet::empty(2)),
                (1, GoalSet::from_bits(0b10, 2)),
            ],
            2,
        );
        let k2 = ReachabilityKey::new(
            &[
                (1, GoalSet::from_bits(0b10, 2)),
                (2, GoalSet::from_bits(0b01, 2)),
            ],
            2,
        );
        assert_eq!(k1, k2);
    }
}
