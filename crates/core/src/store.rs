//! Storage seam for domain stores.
//!
//! Persistence is the host's concern: every store in the domain crates is
//! generic over [`Repository`], and [`InMemoryRepository`] is the default
//! adapter used by tests, the demo seed, and embedded hosts.

use std::collections::HashMap;
use std::hash::Hash;

/// Keyed record storage.
///
/// Mutation takes `&mut self`: callers serialize writes, so a read-then-write
/// sequence on one store is atomic with respect to other callers.
pub trait Repository<K, V> {
    fn get(&self, key: &K) -> Option<V>;
    fn upsert(&mut self, key: K, value: V);
    /// All records, in insertion order.
    fn list(&self) -> Vec<V>;
    fn remove(&mut self, key: &K) -> Option<V>;

    fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory, insertion-ordered store for tests/dev.
#[derive(Debug, Clone)]
pub struct InMemoryRepository<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> InMemoryRepository<K, V> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K, V> Default for InMemoryRepository<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Repository<K, V> for InMemoryRepository<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        self.index.get(key).map(|&pos| self.entries[pos].1.clone())
    }

    fn upsert(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    fn list(&self) -> Vec<V> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let pos = self.index.remove(key)?;
        let (_, value) = self.entries.remove(pos);
        // Shift positions of everything stored after the removed slot.
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(value)
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
