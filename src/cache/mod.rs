/*!
 * Caches
 * Segmented LRU caches backing lock descriptors and metadata maps
 */

mod sharded;
mod slru;

pub use sharded::{CacheConfig, CacheStats, ShardedCache};
pub use slru::{Segment, SlruCache};
