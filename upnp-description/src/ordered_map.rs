//! Insertion-ordered associative container
//!
//! `OrderedMap` keeps a hash index and an entry vector in lock-step so that
//! lookups by key and by position are both O(1), while iteration always
//! follows insertion order. Description collections use it to keep devices,
//! services and state variables in document order.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use thiserror::Error;

/// Returned by [`OrderedMap::add`] when the key is already present
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Duplicate key: {key}")]
pub struct DuplicateKeyError {
    pub key: String,
}

/// Hash map that remembers insertion order
///
/// # Example
///
/// ```rust
/// use upnp_description::OrderedMap;
///
/// let mut map = OrderedMap::new();
/// map.add("b", 2).unwrap();
/// map.add("a", 1).unwrap();
/// assert!(map.add("a", 3).is_err());
///
/// let keys: Vec<_> = map.keys().copied().collect();
/// assert_eq!(keys, vec!["b", "a"]);
/// assert_eq!(map.get_at(1), Some((&"a", &1)));
/// ```
#[derive(Clone)]
pub struct OrderedMap<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> OrderedMap<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a new entry, failing if the key already exists
    pub fn add(&mut self, key: K, value: V) -> Result<(), DuplicateKeyError>
    where
        K: fmt::Display,
    {
        if self.index.contains_key(&key) {
            return Err(DuplicateKeyError {
                key: key.to_string(),
            });
        }
        self.push_unchecked(key, value);
        Ok(())
    }

    /// Replace the value of an existing key in place, or append a new entry
    ///
    /// Returns the previous value when the key was already present.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].1, value)),
            None => {
                self.push_unchecked(key, value);
                None
            }
        }
    }

    fn push_unchecked(&mut self, key: K, value: V) {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = *self.index.get(key)?;
        Some(&mut self.entries[position].1)
    }

    /// Alias of [`get`](Self::get) for callers probing for optional keys
    pub fn try_get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Position of a key in insertion order
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).copied()
    }

    pub fn get_at(&self, position: usize) -> Option<(&K, &V)> {
        self.entries.get(position).map(|(k, v)| (k, v))
    }

    /// Remove the entry at `position`, shifting later entries down
    pub fn remove_at(&mut self, position: usize) -> Option<(K, V)> {
        if position >= self.entries.len() {
            return None;
        }
        let (key, value) = self.entries.remove(position);
        self.index.remove(&key);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some((key, value))
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = *self.index.get(key)?;
        self.remove_at(position).map(|(_, value)| value)
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + ExactSizeIterator {
        self.entries.iter_mut().map(|(_, v)| v)
    }
}

impl<K, V> Default for OrderedMap<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for OrderedMap<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K, V> PartialEq for OrderedMap<K, V>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = std::iter::Map<std::slice::Iter<'a, (K, V)>, fn(&'a (K, V)) -> (&'a K, &'a V)>;

    fn into_iter(self) -> Self::IntoIter {
        fn split<K, V>(entry: &(K, V)) -> (&K, &V) {
            (&entry.0, &entry.1)
        }
        self.entries.iter().map(split as fn(&'a (K, V)) -> (&'a K, &'a V))
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
