/*!
 * Lock Operations
 * File lock lifecycle with lazy expiry
 *
 * Lock descriptors live in side files keyed under the service directory, so
 * the descriptor lock never contends with the item's own path lock.
 */

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::BufReader;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::MountPoint;
use crate::vfs::local::{remove_side_file, LocalStore, SideTree};
use crate::vfs::lock::{now_millis, FileLock};
use crate::vfs::path::Path;
use crate::vfs::types::{FileType, VfsError, VfsResult};

impl MountPoint {
    /// Lock a file and return the new token
    ///
    /// A zero timeout yields a lock that never expires.
    pub fn lock_file(&self, path: &Path, timeout: Duration) -> VfsResult<String> {
        self.require_lockable(path)?;

        let _guard = self.lock_path(LocalStore::side_key(path, SideTree::Locks), true)?;
        if !self.active_lock_held(path)?.is_none() {
            return Err(VfsError::Conflict(format!("file '{}' is already locked", path)));
        }

        let lock = FileLock::generate(timeout);
        self.write_lock_file(path, &lock)?;
        let token = lock.token().to_string();
        self.locks.put(path.clone(), lock);

        info!(path = %path, timeout_ms = timeout.as_millis() as u64, "file locked");
        Ok(token)
    }

    /// Release a lock held with `token`
    pub fn unlock_file(&self, path: &Path, token: &str) -> VfsResult<()> {
        self.require_lockable(path)?;

        let _guard = self.lock_path(LocalStore::side_key(path, SideTree::Locks), true)?;
        let current = self.active_lock_held(path)?;
        if current.is_none() {
            return Err(VfsError::Conflict(format!("file '{}' is not locked", path)));
        }
        if current.token() != token {
            return Err(VfsError::Forbidden(format!(
                "lock token does not match the lock on '{}'",
                path
            )));
        }

        let side = self.store.side_file(path, SideTree::Locks);
        remove_side_file(&side).map_err(|e| VfsError::io(e, format!("unlock {}", path)))?;
        self.locks.put(path.clone(), FileLock::NONE);

        info!(path = %path, "file unlocked");
        Ok(())
    }

    /// True when a file holds an unexpired lock; folders are never locked
    pub fn is_locked(&self, path: &Path) -> VfsResult<bool> {
        match self.file_type_of(path)? {
            FileType::Folder => Ok(false),
            FileType::File => Ok(!self.active_lock(path)?.is_none()),
        }
    }

    /// Current lock of a file, `FileLock::NONE` when unlocked or expired
    pub fn active_lock(&self, path: &Path) -> VfsResult<FileLock> {
        let _guard = self.lock_path(LocalStore::side_key(path, SideTree::Locks), true)?;
        self.active_lock_held(path)
    }

    /// Check that `token` may mutate `path`
    ///
    /// Unlocked files accept any token. Folders are checked through their
    /// descendants instead.
    pub(crate) fn validate_lock_token(&self, path: &Path, token: Option<&str>) -> VfsResult<()> {
        let current = self.active_lock(path)?;
        if current.is_none() || token == Some(current.token()) {
            return Ok(());
        }
        Err(VfsError::Forbidden(format!(
            "file '{}' is locked and the supplied token does not match",
            path
        )))
    }

    /// Fail when any file below `folder` holds an active lock
    pub(crate) fn ensure_no_locked_descendants(&self, folder: &Path) -> VfsResult<()> {
        let mut queue = VecDeque::from([folder.clone()]);
        while let Some(current) = queue.pop_front() {
            for (name, file_type) in self.store.list(&current)? {
                let child = current.child(&name)?;
                match file_type {
                    FileType::Folder => queue.push_back(child),
                    FileType::File => {
                        if !self.active_lock(&child)?.is_none() {
                            return Err(VfsError::Forbidden(format!(
                                "'{}' contains locked file '{}'",
                                folder, child
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Lock-respecting precondition shared by move and delete
    pub(crate) fn check_mutable(
        &self,
        path: &Path,
        file_type: FileType,
        token: Option<&str>,
    ) -> VfsResult<()> {
        match file_type {
            FileType::File => self.validate_lock_token(path, token),
            FileType::Folder => self.ensure_no_locked_descendants(path),
        }
    }

    fn require_lockable(&self, path: &Path) -> VfsResult<()> {
        match self.file_type_of(path)? {
            FileType::File => Ok(()),
            FileType::Folder => Err(VfsError::Forbidden(format!(
                "'{}' is a folder; only files can be locked",
                path
            ))),
        }
    }

    /// Resolve the current lock; caller holds the descriptor's path lock
    fn active_lock_held(&self, path: &Path) -> VfsResult<FileLock> {
        let lock = match self.locks.get(path) {
            Some(lock) => lock,
            None => {
                let lock = self.read_lock_file(path)?;
                self.locks.put(path.clone(), lock.clone());
                lock
            }
        };

        if !lock.is_expired_at(now_millis()) {
            return Ok(lock);
        }

        debug!(path = %path, expires_at = lock.expires_at(), "lock expired");
        let side = self.store.side_file(path, SideTree::Locks);
        if let Err(e) = remove_side_file(&side) {
            warn!(path = %path, error = %e, "failed to delete expired lock file");
        } else if side.exists() {
            warn!(path = %path, "expired lock file still present after delete");
        }
        self.locks.put(path.clone(), FileLock::NONE);
        Ok(FileLock::NONE)
    }

    fn read_lock_file(&self, path: &Path) -> VfsResult<FileLock> {
        let side = self.store.side_file(path, SideTree::Locks);
        if side.is_dir() {
            // Side directory of a folder whose name carries the suffix
            return Ok(FileLock::NONE);
        }
        match File::open(&side) {
            Ok(file) => FileLock::read_descriptor(BufReader::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileLock::NONE),
            Err(e) => Err(VfsError::io(e, format!("read lock of {}", path))),
        }
    }

    fn write_lock_file(&self, path: &Path, lock: &FileLock) -> VfsResult<()> {
        let side = self.store.side_file(path, SideTree::Locks);
        if let Some(dir) = side.parent() {
            fs::create_dir_all(dir).map_err(|e| VfsError::io(e, format!("lock dir of {}", path)))?;
        }
        let mut buf = Vec::new();
        lock.write_descriptor(&mut buf)?;
        fs::write(&side, buf).map_err(|e| VfsError::io(e, format!("write lock of {}", path)))
    }
}
