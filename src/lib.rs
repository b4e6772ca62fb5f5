/*!
 * Workspace VFS
 * Local-disk virtual file system engine for a hosted workspace
 */

pub mod cache;
pub mod core;
pub mod monitoring;
pub mod search;
pub mod vfs;

// Re-exports
pub use cache::{CacheConfig, CacheStats};
pub use monitoring::init_tracing;
pub use search::{IndexedItem, NoopIndexer, SearchIndexer};
pub use vfs::{
    ContentStream, ErrorKind, FileLock, FileType, MountConfig, MountPoint, MountPointBuilder, Path,
    Properties, VfsError, VfsResult, VirtualFile,
};
