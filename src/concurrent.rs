//! Thread-safe containers for decoded configuration collections.
//!
//! The effective configuration is read and occasionally mutated by many
//! server components after load, so every collection field decodes into one
//! of these wrappers instead of a plain `Vec`/`HashMap`/`HashSet`. Defaulted
//! (unset) fields get the same treatment via `Default`.

use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// A list safe for concurrent readers and occasional concurrent writers.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcurrentList<T>(RwLock<Vec<T>>);

impl<T> Default for ConcurrentList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ConcurrentList<T> {
    pub fn new() -> Self {
        Self(RwLock::new(Vec::new()))
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self(RwLock::new(items))
    }

    pub fn push(&self, item: T) {
        self.0.write().push(item);
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl<T: Clone> ConcurrentList<T> {
    /// Point-in-time copy of the contents.
    pub fn snapshot(&self) -> Vec<T> {
        self.0.read().clone()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.0.read().get(index).cloned()
    }
}

impl<T: PartialEq> ConcurrentList<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.0.read().contains(item)
    }
}

impl<T: Clone> Clone for ConcurrentList<T> {
    fn clone(&self) -> Self {
        Self(RwLock::new(self.0.read().clone()))
    }
}

impl<T: fmt::Debug> fmt::Debug for ConcurrentList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.read().iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for ConcurrentList<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.0.read() == *other.0.read()
    }
}

impl<T> FromIterator<T> for ConcurrentList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(RwLock::new(iter.into_iter().collect()))
    }
}

/// A map safe for concurrent readers and occasional concurrent writers.
pub struct ConcurrentMap<K, V>(DashMap<K, V>);

impl<K: Eq + Hash, V> ConcurrentMap<K, V> {
    pub fn new() -> Self {
        Self(DashMap::new())
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.0.insert(key, value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Eq + Hash, V: Clone> ConcurrentMap<K, V> {
    pub fn get(&self, key: &K) -> Option<V> {
        self.0.get(key).map(|entry| entry.value().clone())
    }
}

impl<K: Eq + Hash + Clone, V: Clone> ConcurrentMap<K, V> {
    /// Point-in-time copy of the contents.
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.0
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl<K: Eq + Hash, V> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Clone for ConcurrentMap<K, V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<K: Eq + Hash + fmt::Debug, V: fmt::Debug> fmt::Debug for ConcurrentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in self.0.iter() {
            map.entry(entry.key(), entry.value());
        }
        map.finish()
    }
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for ConcurrentMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().all(|entry| {
                other
                    .0
                    .get(entry.key())
                    .is_some_and(|theirs| *theirs == *entry.value())
            })
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for ConcurrentMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<K, V> Serialize for ConcurrentMap<K, V>
where
    K: Serialize + Eq + Hash,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, K, V> Deserialize<'de> for ConcurrentMap<K, V>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        DashMap::deserialize(deserializer).map(Self)
    }
}

/// A set safe for concurrent readers and occasional concurrent writers.
pub struct ConcurrentSet<T>(DashSet<T>);

impl<T: Eq + Hash> ConcurrentSet<T> {
    pub fn new() -> Self {
        Self(DashSet::new())
    }

    pub fn insert(&self, item: T) -> bool {
        self.0.insert(item)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.0.contains(item)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Eq + Hash + Clone> ConcurrentSet<T> {
    /// Point-in-time copy of the contents.
    pub fn snapshot(&self) -> HashSet<T> {
        self.0.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl<T: Eq + Hash> Default for ConcurrentSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> Clone for ConcurrentSet<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Eq + Hash + fmt::Debug> fmt::Debug for ConcurrentSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for entry in self.0.iter() {
            set.entry(entry.key());
        }
        set.finish()
    }
}

impl<T: Eq + Hash> PartialEq for ConcurrentSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|entry| other.0.contains(entry.key()))
    }
}

impl<T: Eq + Hash> FromIterator<T> for ConcurrentSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> Serialize for ConcurrentSet<T>
where
    T: Serialize + Eq + Hash,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for ConcurrentSet<T>
where
    T: Deserialize<'de> + Eq + Hash,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        DashSet::deserialize(deserializer).map(Self)
    }
}
