//! Single-flight memoization core shared by both description caches
//!
//! Each key owns a slot with two locks: a flight mutex held for the whole
//! fetch, and a value lock held only to read or store the result. The map
//! lock is only held long enough to find, create or drop a slot, so
//! concurrent callers for one key wait for a single fetch while readers and
//! callers for other keys proceed independently.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

struct Slot<V> {
    flight: Mutex<()>,
    value: RwLock<Option<V>>,
}

impl<V: Clone> Slot<V> {
    fn empty() -> Arc<Self> {
        Arc::new(Self {
            flight: Mutex::new(()),
            value: RwLock::new(None),
        })
    }

    fn value(&self) -> Option<V> {
        self.value.read().clone()
    }

    fn is_filled(&self) -> bool {
        self.value.read().is_some()
    }
}

/// Memoizing map that runs at most one fetch per key at a time
pub struct FlightCache<K, V> {
    slots: Mutex<HashMap<K, Arc<Slot<V>>>>,
}

impl<K, V> FlightCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Stored value for `key`, without fetching
    ///
    /// A key whose first fetch is still in flight reads as absent.
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.slots.lock().get(key).cloned()?;
        slot.value()
    }

    /// Stored value for `key`, or the result of running `fetch` once
    ///
    /// Only a successful fetch is stored. When a fetch fails, callers already
    /// waiting on the same key run their own fetch in turn. A value fetched
    /// while the key is being removed is returned but not kept.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let slot = Arc::clone(self.slots.lock().entry(key.clone()).or_insert_with(Slot::empty));
        if let Some(existing) = slot.value() {
            return Ok(existing);
        }

        let flight = slot.flight.lock();
        if let Some(existing) = slot.value() {
            return Ok(existing);
        }

        match fetch() {
            Ok(fetched) => {
                *slot.value.write() = Some(fetched.clone());
                Ok(fetched)
            }
            Err(e) => {
                drop(flight);
                self.discard_if_idle(key, slot);
                Err(e)
            }
        }
    }

    /// Drop an empty slot nobody else is waiting on
    fn discard_if_idle(&self, key: &K, slot: Arc<Slot<V>>) {
        let mut slots = self.slots.lock();
        let idle = slots.get(key).is_some_and(|stored| Arc::ptr_eq(stored, &slot))
            && Arc::strong_count(&slot) == 2
            && !slot.is_filled();
        if idle {
            slots.remove(key);
        }
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn insert(&self, key: K, value: V) {
        let slot = Arc::clone(self.slots.lock().entry(key).or_insert_with(Slot::empty));
        *slot.value.write() = Some(value);
    }

    /// Remove and return the value stored under `key`
    pub fn remove(&self, key: &K) -> Option<V> {
        let slot = self.slots.lock().remove(key)?;
        let value = slot.value.write().take();
        value
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Number of keys holding a value
    pub fn len(&self) -> usize {
        self.slots.lock().values().filter(|slot| slot.is_filled()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently holding a value
    pub fn keys(&self) -> Vec<K> {
        self.slots
            .lock()
            .iter()
            .filter(|(_, slot)| slot.is_filled())
            .map(|(key, _)| key.clone())
            .collect()
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }
}

impl<K, V> Default for FlightCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
