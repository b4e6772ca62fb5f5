/*!
 * Mount Configuration
 * Tunables for one mount point, with environment overrides
 */

use std::time::Duration;

use crate::cache::CacheConfig;
use crate::core::limits::{
    DEFAULT_MEMORY_THRESHOLD, DEFAULT_PATH_LOCK_TIMEOUT, LOCK_CACHE_PROBATIONARY,
    LOCK_CACHE_PROTECTED, PROPS_CACHE_PROBATIONARY, PROPS_CACHE_PROTECTED,
};
use crate::core::WorkloadProfile;

/// Mount point configuration
#[derive(Debug, Clone)]
pub struct MountConfig {
    /// Maximum wait for a per-path lock
    pub path_lock_timeout: Duration,
    /// Content at or above this size is spooled to a temporary file on read
    pub memory_threshold: u64,
    /// Sizing of the lock descriptor cache
    pub lock_cache: CacheConfig,
    /// Sizing of the metadata cache
    pub props_cache: CacheConfig,
    /// Dispatch search index updates on a worker thread instead of inline
    pub background_indexing: bool,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            path_lock_timeout: DEFAULT_PATH_LOCK_TIMEOUT,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
            lock_cache: CacheConfig::for_profile(
                WorkloadProfile::HighContention,
                LOCK_CACHE_PROTECTED,
                LOCK_CACHE_PROBATIONARY,
            ),
            props_cache: CacheConfig::for_profile(
                WorkloadProfile::MediumContention,
                PROPS_CACHE_PROTECTED,
                PROPS_CACHE_PROBATIONARY,
            ),
            background_indexing: true,
        }
    }
}

impl MountConfig {
    /// Small caches and inline indexing, handy for tests and tools
    pub fn compact() -> Self {
        Self {
            lock_cache: CacheConfig::new(4, 16, 32),
            props_cache: CacheConfig::new(4, 16, 32),
            background_indexing: false,
            ..Self::default()
        }
    }

    /// Defaults overlaid with environment variables
    ///
    /// - VFS_LOCK_TIMEOUT_MS: path lock timeout in milliseconds
    /// - VFS_MEMORY_THRESHOLD: in-memory content threshold in bytes
    /// - VFS_CACHE_SHARDS: shard count for both caches
    /// - VFS_BACKGROUND_INDEXING: `1`/`true` or `0`/`false`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_parse::<u64>("VFS_LOCK_TIMEOUT_MS") {
            config.path_lock_timeout = Duration::from_millis(ms);
        }
        if let Some(bytes) = env_parse::<u64>("VFS_MEMORY_THRESHOLD") {
            config.memory_threshold = bytes;
        }
        if let Some(shards) = env_parse::<usize>("VFS_CACHE_SHARDS") {
            config.lock_cache.shards = shards;
            config.props_cache.shards = shards;
        }
        if let Ok(v) = std::env::var("VFS_BACKGROUND_INDEXING") {
            config.background_indexing = v == "1" || v.eq_ignore_ascii_case("true");
        }

        config
    }

    pub fn with_memory_threshold(mut self, bytes: u64) -> Self {
        self.memory_threshold = bytes;
        self
    }

    pub fn with_path_lock_timeout(mut self, timeout: Duration) -> Self {
        self.path_lock_timeout = timeout;
        self
    }

    pub fn with_background_indexing(mut self, enabled: bool) -> Self {
        self.background_indexing = enabled;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}
