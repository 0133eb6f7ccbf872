//! Request-scoped natural-key cache
//!
//! Lives for exactly one import call. Every insert is journaled so the
//! entries written while processing a rejected row can be dropped together
//! with that row's savepoint.

use std::collections::HashMap;
use std::hash::Hash;

/// Position in the journal to roll back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheCheckpoint(usize);

#[derive(Debug)]
pub struct EntityCache<K, V> {
    entries: HashMap<K, V>,
    /// (key, value it replaced)
    journal: Vec<(K, Option<V>)>,
}

impl<K, V> Default for EntityCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            journal: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> EntityCache<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        let previous = self.entries.insert(key.clone(), value);
        self.journal.push((key, previous));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn checkpoint(&self) -> CacheCheckpoint {
        CacheCheckpoint(self.journal.len())
    }

    /// Undo every insert made after `checkpoint`, newest first
    pub fn rollback_to(&mut self, checkpoint: CacheCheckpoint) {
        while self.journal.len() > checkpoint.0 {
            let Some((key, previous)) = self.journal.pop() else { break };
            match previous {
                Some(value) => {
                    self.entries.insert(key, value);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }
}
