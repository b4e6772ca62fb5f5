/*!
 * Sharded Cache
 * SLRU partitions selected by `hash(key) & mask` to reduce contention
 */

use ahash::RandomState;
use parking_lot::Mutex;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU64, Ordering};

use super::slru::SlruCache;
use crate::core::{ShardManager, WorkloadProfile};

/// Sizing of one sharded cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of partitions, rounded up to a power of 2
    pub shards: usize,
    /// Protected segment capacity per shard
    pub protected_capacity: usize,
    /// Probationary segment capacity per shard
    pub probationary_capacity: usize,
}

impl CacheConfig {
    pub const fn new(
        shards: usize,
        protected_capacity: usize,
        probationary_capacity: usize,
    ) -> Self {
        Self {
            shards,
            protected_capacity,
            probationary_capacity,
        }
    }

    /// Shard count derived from the host CPU count
    pub fn for_profile(
        profile: WorkloadProfile,
        protected_capacity: usize,
        probationary_capacity: usize,
    ) -> Self {
        Self::new(
            ShardManager::shards(profile),
            protected_capacity,
            probationary_capacity,
        )
    }
}

/// Concurrent SLRU cache
pub struct ShardedCache<K: Hash + Eq, V> {
    name: &'static str,
    shards: Box<[Mutex<SlruCache<K, V>>]>,
    shard_mask: usize,
    hasher: RandomState,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Hash + Eq + Clone, V: Clone> ShardedCache<K, V> {
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        let shard_count = ShardManager::normalize(config.shards);
        let shards = (0..shard_count)
            .map(|_| {
                Mutex::new(SlruCache::new(
                    config.protected_capacity,
                    config.probationary_capacity,
                ))
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        tracing::debug!(
            cache = name,
            shards = shard_count,
            protected = config.protected_capacity,
            probationary = config.probationary_capacity,
            "cache created"
        );

        Self {
            name,
            shards,
            shard_mask: shard_count - 1,
            hasher: RandomState::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard(&self, key: &K) -> &Mutex<SlruCache<K, V>> {
        let idx = (self.hasher.hash_one(key) as usize) & self.shard_mask;
        &self.shards[idx]
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let value = self.shard(key).lock().get(key);
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    pub fn put(&self, key: K, value: V) {
        self.shard(&key).lock().put(key, value);
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.shard(key).lock().remove(key)
    }

    /// Drop every entry in every shard
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().clear();
        }
        tracing::debug!(cache = self.name, "cache cleared");
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.lock().is_empty())
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            name: self.name,
            size: self.len(),
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub name: &'static str,
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
