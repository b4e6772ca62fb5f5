/*!
 * Segmented LRU
 *
 * Two LRU segments: entries land in the probationary segment on insert and
 * move to the protected segment when they are hit again. Protected overflow
 * demotes its least-recently-accessed entry back to probationary; probationary
 * overflow drops its oldest entry from the cache entirely.
 */

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Which segment an entry currently lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Protected,
    Probationary,
}

/// Single-threaded SLRU cache; see `ShardedCache` for the concurrent wrapper
pub struct SlruCache<K: Hash + Eq, V> {
    protected: LruCache<K, V>,
    probationary: LruCache<K, V>,
}

fn capacity(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
}

impl<K: Hash + Eq + Clone, V: Clone> SlruCache<K, V> {
    pub fn new(protected_capacity: usize, probationary_capacity: usize) -> Self {
        Self {
            protected: LruCache::new(capacity(protected_capacity)),
            probationary: LruCache::new(capacity(probationary_capacity)),
        }
    }

    /// Look up `key`, promoting a probationary hit to protected
    pub fn get(&mut self, key: &K) -> Option<V> {
        if let Some(value) = self.protected.get(key) {
            return Some(value.clone());
        }

        let (key, value) = self.probationary.pop_entry(key)?;
        self.promote(key, value.clone());
        Some(value)
    }

    /// Insert or replace
    ///
    /// A key already in the protected segment keeps its place there; anything
    /// else (re)enters probationary.
    pub fn put(&mut self, key: K, value: V) {
        if let Some(slot) = self.protected.get_mut(&key) {
            *slot = value;
            return;
        }
        self.probationary.put(key, value);
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.protected
            .pop(key)
            .or_else(|| self.probationary.pop(key))
    }

    /// Segment holding `key`, without touching recency
    pub fn segment_of(&self, key: &K) -> Option<Segment> {
        if self.protected.contains(key) {
            Some(Segment::Protected)
        } else if self.probationary.contains(key) {
            Some(Segment::Probationary)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.protected.clear();
        self.probationary.clear();
    }

    pub fn len(&self) -> usize {
        self.protected.len() + self.probationary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protected.is_empty() && self.probationary.is_empty()
    }

    pub fn protected_len(&self) -> usize {
        self.protected.len()
    }

    pub fn probationary_len(&self) -> usize {
        self.probationary.len()
    }

    fn promote(&mut self, key: K, value: V) {
        if self.protected.len() >= self.protected.cap().get() {
            if let Some((demoted_key, demoted_value)) = self.protected.pop_lru() {
                self.probationary.put(demoted_key, demoted_value);
            }
        }
        self.protected.put(key, value);
    }
}
