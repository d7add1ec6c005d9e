// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reference-counted interning of backend state objects.
//!
//! Pipelines are compiled from value descriptors. Interning each sub-state
//! means equal descriptors resolve to the same [`StateKey`], so comparing keys
//! is enough to know whether two pipelines share a piece of state.

use crate::graphic::error::GraphicError;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Identifies one interned state object. Keys start at one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(pub u32);

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}", self.0)
    }
}

#[derive(Debug)]
struct CacheEntry<K, V> {
    descriptor: K,
    value: V,
    references: u32,
}

/// Interns descriptors of type `K` into backend objects of type `V`.
#[derive(Debug)]
pub struct StateCache<K, V> {
    lookup: HashMap<K, StateKey>,
    entries: Vec<Option<CacheEntry<K, V>>>,
    free: Vec<usize>,
}

impl<K, V> Default for StateCache<K, V> {
    fn default() -> Self {
        Self {
            lookup: HashMap::new(),
            entries: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<K: Clone + Eq + Hash, V> StateCache<K, V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key for `descriptor`, creating the backend object with
    /// `create` on first use. Every call takes one reference.
    pub fn intern<F>(&mut self, descriptor: &K, create: F) -> Result<StateKey, GraphicError>
    where
        F: FnOnce(&K) -> Result<V, GraphicError>,
    {
        if let Some(&key) = self.lookup.get(descriptor) {
            if let Some(entry) = self.slot_mut(key) {
                entry.references += 1;
            }
            return Ok(key);
        }

        let value = create(descriptor)?;
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.entries.push(None);
                self.entries.len() - 1
            }
        };
        self.entries[index] = Some(CacheEntry {
            descriptor: descriptor.clone(),
            value,
            references: 1,
        });
        let key = StateKey(index as u32 + 1);
        self.lookup.insert(descriptor.clone(), key);
        Ok(key)
    }

    /// The key `descriptor` is interned under, without taking a reference.
    pub fn find(&self, descriptor: &K) -> Option<StateKey> {
        self.lookup.get(descriptor).copied()
    }

    /// Drops one reference. Returns the backend object once the last
    /// reference is gone.
    pub fn release(&mut self, key: StateKey) -> Option<V> {
        let index = (key.0 as usize).checked_sub(1)?;
        let entry = self.entries.get_mut(index)?.as_mut()?;
        entry.references -= 1;
        if entry.references > 0 {
            return None;
        }
        let entry = self.entries[index].take()?;
        self.lookup.remove(&entry.descriptor);
        self.free.push(index);
        Some(entry.value)
    }

    /// The backend object behind `key`.
    pub fn get(&self, key: StateKey) -> Option<&V> {
        let index = (key.0 as usize).checked_sub(1)?;
        self.entries
            .get(index)?
            .as_ref()
            .map(|entry| &entry.value)
    }

    /// The descriptor `key` was interned from.
    pub fn descriptor(&self, key: StateKey) -> Option<&K> {
        let index = (key.0 as usize).checked_sub(1)?;
        self.entries
            .get(index)?
            .as_ref()
            .map(|entry| &entry.descriptor)
    }

    /// Live reference count of `key`.
    pub fn references(&self, key: StateKey) -> u32 {
        (key.0 as usize)
            .checked_sub(1)
            .and_then(|index| self.entries.get(index))
            .and_then(Option::as_ref)
            .map_or(0, |entry| entry.references)
    }

    /// Number of distinct live objects.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// Returns `true` if nothing is interned.
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Drops every object regardless of references.
    pub fn clear(&mut self) {
        self.lookup.clear();
        self.entries.clear();
        self.free.clear();
    }

    fn slot_mut(&mut self, key: StateKey) -> Option<&mut CacheEntry<K, V>> {
        let index = (key.0 as usize).checked_sub(1)?;
        self.entries.get_mut(index)?.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_descriptors_share_a_key() {
        let mut cache = StateCache::<u32, String>::new();
        let mut created = 0;
        let a = cache
            .intern(&7, |d| {
                created += 1;
                Ok(format!("object {d}"))
            })
            .unwrap();
        let b = cache.intern(&7, |_| unreachable!()).unwrap();
        let c = cache.intern(&8, |d| Ok(format!("object {d}"))).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(created, 1);
        assert_eq!(cache.references(a), 2);
        assert_eq!(cache.get(a).map(String::as_str), Some("object 7"));
    }

    #[test]
    fn test_last_release_frees_and_recycles() {
        let mut cache = StateCache::<u32, u32>::new();
        let a = cache.intern(&1, |_| Ok(10)).unwrap();
        cache.intern(&1, |_| Ok(10)).unwrap();

        assert_eq!(cache.release(a), None);
        assert_eq!(cache.release(a), Some(10));
        assert!(cache.get(a).is_none());
        assert!(cache.is_empty());

        let b = cache.intern(&2, |_| Ok(20)).unwrap();
        assert_eq!(a, b, "freed slot is reused");
        assert_eq!(cache.descriptor(b), Some(&2));
    }

    #[test]
    fn test_failed_creation_interns_nothing() {
        let mut cache = StateCache::<u32, u32>::new();
        let result = cache.intern(&1, |_| Err(GraphicError::Unsupported("test state")));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
