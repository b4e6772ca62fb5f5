/*!
 * File Operations
 * Creation and content I/O for regular files
 */

use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::time::SystemTime;

use tracing::{debug, info};

use super::MountPoint;
use crate::search::IndexTask;
use crate::vfs::content::{copy_buffered, ContentStream};
use crate::vfs::path::Path;
use crate::vfs::types::{FileType, VfsError, VfsResult};

impl MountPoint {
    /// Create a new file under `parent`, optionally with initial content
    pub fn create_file(
        &self,
        parent: &Path,
        name: &str,
        content: Option<&mut dyn Read>,
    ) -> VfsResult<Path> {
        self.require_folder(parent)?;
        let path = self.checked_child(parent, name)?;

        {
            let _guard = self.lock_path(path.clone(), true)?;
            let native = self.store.native(&path);
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&native)
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::AlreadyExists => {
                        VfsError::Conflict(format!("item '{}' already exists", path))
                    }
                    _ => VfsError::io(e, format!("create {}", path)),
                })?;

            if let Some(reader) = content {
                copy_buffered(reader, &mut file)
                    .map_err(|e| VfsError::io(e, format!("write {}", path)))?;
            }
        }

        info!(path = %path, "file created");
        self.notify(IndexTask::Add(self.indexed(&path, FileType::File)));
        Ok(path)
    }

    /// Snapshot of a file's content
    ///
    /// The path lock is released before this returns; large files are served
    /// from a temporary copy.
    pub fn get_content(&self, path: &Path) -> VfsResult<ContentStream> {
        self.require_file(path)?;

        let _guard = self.lock_path(path.clone(), false)?;
        let mut file = File::open(self.store.native(path))
            .map_err(|e| VfsError::io(e, format!("open {}", path)))?;
        let len = file
            .metadata()
            .map_err(|e| VfsError::io(e, format!("stat {}", path)))?
            .len();

        let stream = ContentStream::capture(&mut file, len, self.config.memory_threshold)
            .map_err(|e| VfsError::io(e, format!("read {}", path)))?;
        debug!(path = %path, len, spooled = stream.is_spooled(), "content read");
        Ok(stream)
    }

    /// Replace a file's content
    pub fn update_content(
        &self,
        path: &Path,
        content: &mut dyn Read,
        lock_token: Option<&str>,
    ) -> VfsResult<()> {
        self.require_file(path)?;
        self.validate_lock_token(path, lock_token)?;

        let written = {
            let _guard = self.lock_path(path.clone(), true)?;
            let mut file = File::create(self.store.native(path))
                .map_err(|e| VfsError::io(e, format!("open {} for write", path)))?;
            copy_buffered(content, &mut file)
                .map_err(|e| VfsError::io(e, format!("write {}", path)))?
        };

        debug!(path = %path, written, "content updated");
        self.notify(IndexTask::Update(self.indexed(path, FileType::File)));
        Ok(())
    }

    /// Size in bytes; folders report zero
    pub fn length(&self, path: &Path) -> VfsResult<u64> {
        match self.file_type_of(path)? {
            FileType::Folder => Ok(0),
            FileType::File => fs::metadata(self.store.native(path))
                .map(|md| md.len())
                .map_err(|e| VfsError::io(e, format!("stat {}", path))),
        }
    }

    pub fn last_modified(&self, path: &Path) -> VfsResult<SystemTime> {
        self.file_type_of(path)?;
        fs::metadata(self.store.native(path))
            .and_then(|md| md.modified())
            .map_err(|e| VfsError::io(e, format!("stat {}", path)))
    }
}
