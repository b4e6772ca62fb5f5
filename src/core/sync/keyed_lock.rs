/*!
 * Keyed Read/Write Locks
 *
 * Hands out shared or exclusive locks keyed by an arbitrary value. Keys are
 * partitioned across power-of-2 shards so bookkeeping for unrelated keys rarely
 * touches the same mutex, and holders of one key never block another key.
 * Waiters park on the shard's condvar up to a caller-supplied timeout.
 */

use ahash::RandomState;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::time::{Duration, Instant};

/// Lock acquisition did not complete before the timeout
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("lock not acquired within {waited:?}")]
pub struct LockTimeout {
    pub waited: Duration,
}

/// Holders of one key
#[derive(Debug, Default)]
struct Holders {
    readers: usize,
    writer: bool,
}

impl Holders {
    #[inline]
    fn admits(&self, exclusive: bool) -> bool {
        if exclusive {
            !self.writer && self.readers == 0
        } else {
            !self.writer
        }
    }

    #[inline]
    fn take(&mut self, exclusive: bool) {
        if exclusive {
            self.writer = true;
        } else {
            self.readers += 1;
        }
    }

    #[inline]
    fn give_back(&mut self, exclusive: bool) {
        if exclusive {
            self.writer = false;
        } else {
            self.readers -= 1;
        }
    }

    #[inline]
    fn is_idle(&self) -> bool {
        !self.writer && self.readers == 0
    }
}

struct LockShard<K> {
    holders: Mutex<HashMap<K, Holders>>,
    released: Condvar,
}

/// Factory of per-key read/write locks
pub struct KeyedLockFactory<K> {
    shards: Box<[LockShard<K>]>,
    shard_mask: usize,
    hasher: RandomState,
}

impl<K: Hash + Eq + Clone> KeyedLockFactory<K> {
    /// Create a factory with `shard_count` shards (rounded up to a power of 2)
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1).next_power_of_two();
        let shards = (0..shard_count)
            .map(|_| LockShard {
                holders: Mutex::new(HashMap::new()),
                released: Condvar::new(),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            shard_mask: shard_count - 1,
            hasher: RandomState::new(),
        }
    }

    #[inline]
    fn shard(&self, key: &K) -> &LockShard<K> {
        let idx = (self.hasher.hash_one(key) as usize) & self.shard_mask;
        &self.shards[idx]
    }

    /// Handle for `key`; nothing is held until `acquire`
    pub fn get_lock(&self, key: K, exclusive: bool) -> KeyedLock<'_, K> {
        KeyedLock {
            factory: self,
            key,
            exclusive,
        }
    }

    /// Number of keys currently held by someone
    pub fn held_count(&self) -> usize {
        self.shards.iter().map(|s| s.holders.lock().len()).sum()
    }
}

/// An acquirable lock on one key
pub struct KeyedLock<'a, K: Hash + Eq + Clone> {
    factory: &'a KeyedLockFactory<K>,
    key: K,
    exclusive: bool,
}

impl<'a, K: Hash + Eq + Clone> KeyedLock<'a, K> {
    /// Block up to `timeout` for the lock
    pub fn acquire(self, timeout: Duration) -> Result<KeyedLockGuard<'a, K>, LockTimeout> {
        let shard = self.factory.shard(&self.key);
        let deadline = Instant::now() + timeout;
        let mut holders = shard.holders.lock();

        loop {
            let admitted = holders
                .get(&self.key)
                .map_or(true, |h| h.admits(self.exclusive));

            if admitted {
                holders
                    .entry(self.key.clone())
                    .or_default()
                    .take(self.exclusive);
                return Ok(KeyedLockGuard {
                    factory: self.factory,
                    key: self.key,
                    exclusive: self.exclusive,
                });
            }

            if shard.released.wait_until(&mut holders, deadline).timed_out() {
                // One last look: a release may have raced the deadline
                let admitted = holders
                    .get(&self.key)
                    .map_or(true, |h| h.admits(self.exclusive));
                if !admitted {
                    return Err(LockTimeout { waited: timeout });
                }
            }
        }
    }
}

/// Held lock; released on drop
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct KeyedLockGuard<'a, K: Hash + Eq + Clone> {
    factory: &'a KeyedLockFactory<K>,
    key: K,
    exclusive: bool,
}

impl<K: Hash + Eq + Clone> KeyedLockGuard<'_, K> {
    /// Release explicitly
    pub fn release(self) {
        drop(self);
    }

    #[inline]
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}

impl<K: Hash + Eq + Clone> Drop for KeyedLockGuard<'_, K> {
    fn drop(&mut self) {
        let shard = self.factory.shard(&self.key);
        let mut holders = shard.holders.lock();
        if let Some(h) = holders.get_mut(&self.key) {
            h.give_back(self.exclusive);
            if h.is_idle() {
                holders.remove(&self.key);
            }
        }
        drop(holders);
        shard.released.notify_all();
    }
}
