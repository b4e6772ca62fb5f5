/*!
 * Synchronization Primitives
 *
 * Keyed read/write locks used to serialize work on a single path without
 * blocking unrelated paths.
 */

mod keyed_lock;

pub use keyed_lock::{KeyedLock, KeyedLockFactory, KeyedLockGuard, LockTimeout};
