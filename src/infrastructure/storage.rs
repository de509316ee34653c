//! Storage implementations for per-domain rate windows.
//!
//! Provides concurrent, sharded storage keyed by domain name.

use crate::application::ports::Storage;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;

/// Thread-safe sharded storage backed by DashMap.
///
/// Each key lives in one shard guarded by its own lock, so admissions for
/// unrelated domains rarely contend while admissions for the same domain are
/// serialized.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    map: DashMap<K, V>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    /// Create a new sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Hash + Eq + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn upsert_if<F>(&self, key: K, decide: F) -> bool
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        // The entry guard holds the shard's write lock until the end of the match
        match self.map.entry(key) {
            Entry::Occupied(mut occupied) => match decide(Some(occupied.get())) {
                Some(value) => {
                    occupied.insert(value);
                    true
                }
                None => false,
            },
            Entry::Vacant(vacant) => match decide(None) {
                Some(value) => {
                    vacant.insert(value);
                    true
                }
                None => false,
            },
        }
    }

    fn get_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.map.retain(f);
    }
}
