/*!
 * Mount Point
 * Root aggregate for one workspace's local-disk VFS
 *
 * Owns the lock and metadata caches, the per-path lock factory and the search
 * index queue. Every `VirtualFile` operation is dispatched here; the `*_ops`
 * submodules hold the per-concern halves of `impl MountPoint`.
 */

mod archive_ops;
mod dir_ops;
mod file_ops;
mod lock_ops;
mod metadata_ops;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use super::config::MountConfig;
use super::local::LocalStore;
use super::lock::FileLock;
use super::path::Path;
use super::properties::Properties;
use super::types::{FileType, VfsError, VfsResult};
use super::virtual_file::VirtualFile;
use crate::cache::{CacheStats, ShardedCache};
use crate::core::limits::SERVICE_DIR;
use crate::core::sync::{KeyedLockFactory, KeyedLockGuard};
use crate::core::{ShardManager, WorkloadProfile};
use crate::search::{IndexQueue, IndexTask, IndexedItem, NoopIndexer, SearchIndexer};

/// Per-path read/write locks
pub type PathLockFactory = KeyedLockFactory<Path>;

/// Local-disk mount point
pub struct MountPoint {
    pub(super) store: LocalStore,
    pub(super) config: MountConfig,
    pub(super) locks: ShardedCache<Path, FileLock>,
    pub(super) props: ShardedCache<Path, Properties>,
    pub(super) path_locks: PathLockFactory,
    pub(super) index: IndexQueue,
}

/// Builder for MountPoint
pub struct MountPointBuilder {
    root: PathBuf,
    config: MountConfig,
    indexer: Arc<dyn SearchIndexer>,
}

impl MountPointBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config: MountConfig::default(),
            indexer: Arc::new(NoopIndexer),
        }
    }

    pub fn with_config(mut self, config: MountConfig) -> Self {
        self.config = config;
        self
    }

    /// Search indexer notified after committed mutations
    pub fn with_indexer(mut self, indexer: Arc<dyn SearchIndexer>) -> Self {
        self.indexer = indexer;
        self
    }

    pub fn build(self) -> VfsResult<MountPoint> {
        let store = LocalStore::open(self.root)?;
        let index = if self.config.background_indexing {
            IndexQueue::background(self.indexer)?
        } else {
            IndexQueue::inline(self.indexer)
        };

        info!(
            root = %store.root().display(),
            background_indexing = index.is_background(),
            "mount point ready"
        );

        Ok(MountPoint {
            locks: ShardedCache::new("locks", self.config.lock_cache),
            props: ShardedCache::new("props", self.config.props_cache),
            path_locks: PathLockFactory::new(ShardManager::shards(WorkloadProfile::HighContention)),
            store,
            config: self.config,
            index,
        })
    }
}

impl MountPoint {
    pub fn builder(root: impl Into<PathBuf>) -> MountPointBuilder {
        MountPointBuilder::new(root)
    }

    /// Mount `root` with default configuration and no indexer
    pub fn open(root: impl Into<PathBuf>) -> VfsResult<Self> {
        Self::builder(root).build()
    }

    pub fn config(&self) -> &MountConfig {
        &self.config
    }

    /// Native directory backing the mount
    pub fn native_root(&self) -> &std::path::Path {
        self.store.root()
    }

    pub fn root(&self) -> VirtualFile<'_> {
        VirtualFile::new(Path::root(), self)
    }

    /// Handle for `path`; the item need not exist
    pub fn get_virtual_file(&self, path: &Path) -> VirtualFile<'_> {
        VirtualFile::new(path.clone(), self)
    }

    /// Handle for an existing item
    pub fn get_existing(&self, raw: &str) -> VfsResult<VirtualFile<'_>> {
        let path = Path::parse(raw)?;
        self.file_type_of(&path)?;
        Ok(VirtualFile::new(path, self))
    }

    /// Lock cache, then metadata cache
    pub fn cache_stats(&self) -> [CacheStats; 2] {
        [self.locks.stats(), self.props.stats()]
    }

    // =========================================================================
    // Shared helpers for the *_ops modules
    // =========================================================================

    pub(crate) fn file_type(&self, path: &Path) -> Option<FileType> {
        self.store.file_type(path)
    }

    pub(crate) fn file_type_of(&self, path: &Path) -> VfsResult<FileType> {
        self.store
            .file_type(path)
            .ok_or_else(|| VfsError::NotFound(format!("item '{}' does not exist", path)))
    }

    pub(crate) fn require_folder(&self, path: &Path) -> VfsResult<()> {
        match self.file_type_of(path)? {
            FileType::Folder => Ok(()),
            FileType::File => Err(VfsError::Forbidden(format!("'{}' is not a folder", path))),
        }
    }

    pub(crate) fn require_file(&self, path: &Path) -> VfsResult<()> {
        match self.file_type_of(path)? {
            FileType::File => Ok(()),
            FileType::Folder => Err(VfsError::Forbidden(format!("'{}' is not a file", path))),
        }
    }

    /// Validated child of `parent`; the service directory name is reserved at the root
    pub(crate) fn checked_child(&self, parent: &Path, name: &str) -> VfsResult<Path> {
        let child = parent.child(name)?;
        if parent.is_root() && name == SERVICE_DIR {
            return Err(VfsError::Forbidden(format!("'{}' is a reserved name", name)));
        }
        Ok(child)
    }

    /// Acquire a path lock with the configured timeout
    pub(crate) fn lock_path(
        &self,
        key: Path,
        exclusive: bool,
    ) -> VfsResult<KeyedLockGuard<'_, Path>> {
        let timeout = self.config.path_lock_timeout;
        self.path_locks
            .get_lock(key.clone(), exclusive)
            .acquire(timeout)
            .map_err(|e| VfsError::Timeout(format!("path lock on '{}': {}", key, e)))
    }

    /// Drop every cached lock and metadata entry
    pub(crate) fn invalidate_caches(&self) {
        self.locks.clear();
        self.props.clear();
    }

    pub(crate) fn indexed(&self, path: &Path, file_type: FileType) -> IndexedItem {
        IndexedItem {
            path: path.clone(),
            native: self.store.native(path),
            file_type,
        }
    }

    pub(crate) fn notify(&self, task: IndexTask) {
        self.index.submit(task);
    }
}

impl std::fmt::Debug for MountPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountPoint")
            .field("root", &self.store.root())
            .field("config", &self.config)
            .finish()
    }
}
