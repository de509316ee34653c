//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

/// Port for obtaining current time.
///
/// Rate windows are measured on a monotonic clock. Infrastructure provides
/// concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for concurrent keyed window storage.
///
/// Implementations must run `upsert_if` as one critical section per key, so
/// that two concurrent callers for the same key observe each other's writes.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Send + Sync,
    V: Send + Sync,
{
    /// Inspect the entry for `key` under its lock and optionally replace it.
    ///
    /// `decide` receives the current value, if any. When it returns
    /// `Some(value)` the entry is inserted or overwritten; `None` leaves the
    /// storage untouched (an absent key stays absent).
    ///
    /// # Returns
    /// True if a value was written
    fn upsert_if<F>(&self, key: K, decide: F) -> bool
    where
        F: FnOnce(Option<&V>) -> Option<V>;

    /// Get a copy of the value stored for `key`.
    fn get_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Remove entries for which the predicate returns false.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;
}
