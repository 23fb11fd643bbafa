//! TTL cache for provider results.
//!
//! Owned by the app state rather than a module-level global, with an
//! injectable clock so tests can age entries deterministically. Reads are
//! read-through: a concurrent miss may fetch twice, which is acceptable for
//! idempotent provider queries.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

struct Entry<V> {
    stored_at: Instant,
    value: V,
}

pub struct TtlCache<K, V> {
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
    max_entries: usize,
    clock: Clock,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(Instant::now))
    }

    pub fn with_clock(ttl: Duration, max_entries: usize, clock: Clock) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
            clock,
        }
    }

    /// Fresh value for the key, or `None` when absent or expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = (self.clock)();
        let entry = self.entries.get(key)?;
        if now.duration_since(entry.stored_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                stored_at: (self.clock)(),
                value,
            },
        );
        self.prune();
    }

    /// Drop expired entries, then oldest-first down to the entry cap.
    fn prune(&self) {
        let now = (self.clock)();
        let mut stamped: Vec<(K, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.stored_at))
            .collect();

        for (key, stored_at) in &stamped {
            if now.duration_since(*stored_at) >= self.ttl {
                self.entries.remove(key);
            }
        }

        if self.entries.len() <= self.max_entries {
            return;
        }

        stamped.sort_by_key(|(_, stored_at)| *stored_at);
        for (key, _) in stamped {
            if self.entries.len() <= self.max_entries {
                break;
            }
            self.entries.remove(&key);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
