/*!
 * System Limits and Constants
 *
 * Centralized location for the engine's limits, thresholds, and magic numbers.
 * Grouped by subsystem.
 */

use std::time::Duration;

// =============================================================================
// ON-DISK LAYOUT
// =============================================================================

/// Hidden service directory at the mount root
pub const SERVICE_DIR: &str = ".vfs";

/// Lock descriptor tree under the service directory
pub const LOCKS_DIR: &str = "locks";

/// Metadata tree under the service directory
pub const PROPS_DIR: &str = "props";

/// Suffix appended to the item name for its lock descriptor
pub const LOCK_FILE_SUFFIX: &str = "_lock";

/// Suffix appended to the item name for its metadata file
pub const PROPS_FILE_SUFFIX: &str = "_props";

// =============================================================================
// LOCKING
// =============================================================================

/// Maximum wait for a per-path lock before the operation fails
pub const DEFAULT_PATH_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Expiry value of a lock that never expires
pub const LOCK_NEVER_EXPIRES: u64 = u64::MAX;

// =============================================================================
// CONTENT
// =============================================================================

/// Files below this size are buffered in memory on read (200KB)
/// Larger files are spooled to a temporary file so the path lock can be released
pub const DEFAULT_MEMORY_THRESHOLD: u64 = 200 * 1024;

/// Copy buffer for spooling and hashing (8KB)
pub const COPY_BUFFER_SIZE: usize = 8 * 1024;

// =============================================================================
// CACHES
// =============================================================================

/// Protected segment capacity per shard of the lock cache
pub const LOCK_CACHE_PROTECTED: usize = 100;

/// Probationary segment capacity per shard of the lock cache
pub const LOCK_CACHE_PROBATIONARY: usize = 200;

/// Protected segment capacity per shard of the metadata cache
pub const PROPS_CACHE_PROTECTED: usize = 100;

/// Probationary segment capacity per shard of the metadata cache
pub const PROPS_CACHE_PROBATIONARY: usize = 200;

// =============================================================================
// INDEXING
// =============================================================================

/// Name of the background index worker thread
pub const INDEX_WORKER_NAME: &str = "vfs-indexer";
