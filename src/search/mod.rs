/*!
 * Search Index Seam
 *
 * The engine notifies an external indexer after every committed mutation.
 * Notifications are best-effort: failures are logged and never reach the
 * caller of the triggering operation.
 */

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::core::limits::INDEX_WORKER_NAME;
use crate::vfs::path::Path;
use crate::vfs::types::{FileType, VfsError, VfsResult};

/// Snapshot of an item handed to the indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedItem {
    pub path: Path,
    /// Native location, for indexers that read content
    pub native: PathBuf,
    pub file_type: FileType,
}

/// External full-text indexer
pub trait SearchIndexer: Send + Sync {
    /// A new item (and for folders, its subtree) appeared
    fn add(&self, item: &IndexedItem) -> anyhow::Result<()>;

    /// Content of an existing item changed
    fn update(&self, item: &IndexedItem) -> anyhow::Result<()>;

    /// An item (and for folders, its subtree) is gone
    fn delete(&self, path: &Path, is_file: bool) -> anyhow::Result<()>;
}

/// Indexer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndexer;

impl SearchIndexer for NoopIndexer {
    fn add(&self, _item: &IndexedItem) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&self, _item: &IndexedItem) -> anyhow::Result<()> {
        Ok(())
    }

    fn delete(&self, _path: &Path, _is_file: bool) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One pending notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexTask {
    Add(IndexedItem),
    Update(IndexedItem),
    Delete { path: Path, is_file: bool },
}

impl IndexTask {
    fn run(&self, indexer: &dyn SearchIndexer) {
        let (op, path, result) = match self {
            IndexTask::Add(item) => ("add", &item.path, indexer.add(item)),
            IndexTask::Update(item) => ("update", &item.path, indexer.update(item)),
            IndexTask::Delete { path, is_file } => ("delete", path, indexer.delete(path, *is_file)),
        };

        match result {
            Ok(()) => debug!(op, path = %path, "index updated"),
            Err(e) => warn!(op, path = %path, error = %e, "search index update failed"),
        }
    }
}

/// Dispatches notifications either inline or on a worker thread
///
/// Dropping the queue drains pending background tasks before returning.
pub(crate) struct IndexQueue {
    indexer: Arc<dyn SearchIndexer>,
    sender: Option<flume::Sender<IndexTask>>,
    worker: Option<JoinHandle<()>>,
}

impl IndexQueue {
    /// Run every notification on the calling thread
    pub fn inline(indexer: Arc<dyn SearchIndexer>) -> Self {
        Self {
            indexer,
            sender: None,
            worker: None,
        }
    }

    /// Run notifications on a dedicated worker thread
    pub fn background(indexer: Arc<dyn SearchIndexer>) -> VfsResult<Self> {
        let (sender, receiver) = flume::unbounded::<IndexTask>();
        let worker_indexer = Arc::clone(&indexer);

        let worker = std::thread::Builder::new()
            .name(INDEX_WORKER_NAME.to_string())
            .spawn(move || {
                for task in receiver.iter() {
                    task.run(worker_indexer.as_ref());
                }
                debug!("index worker stopped");
            })
            .map_err(|e| VfsError::io(e, "spawn index worker"))?;

        Ok(Self {
            indexer,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Fire and forget
    pub fn submit(&self, task: IndexTask) {
        match &self.sender {
            Some(sender) => {
                if let Err(flume::SendError(task)) = sender.send(task) {
                    warn!(task = ?task, "index worker gone, running inline");
                    task.run(self.indexer.as_ref());
                }
            }
            None => task.run(self.indexer.as_ref()),
        }
    }

    pub fn is_background(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for IndexQueue {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the backlog is drained
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("index worker panicked");
            }
        }
    }
}
