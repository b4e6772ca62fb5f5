/*!
 * Directory Operations
 * Folder creation, traversal and structural mutation
 *
 * Move and rename are copy-then-delete. A failure between the two steps
 * leaves both copies in place.
 */

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::Read;

use tracing::info;

use super::MountPoint;
use crate::monitoring::span_operation;
use crate::core::limits::COPY_BUFFER_SIZE;
use crate::search::IndexTask;
use crate::vfs::local::{
    copy_side_dir, copy_side_file, copy_tree, remove_dir_if_exists, remove_file_if_exists,
    remove_side_dir, remove_side_file, LocalStore, SideTree,
};
use crate::vfs::path::Path;
use crate::vfs::types::{FileType, VfsError, VfsResult};

impl MountPoint {
    /// Create a folder hierarchy below `parent`
    ///
    /// `name` may span several levels (`a/b/c`). Returns the first folder that
    /// did not exist before; a fully pre-existing hierarchy is a conflict.
    pub fn create_folder(&self, parent: &Path, name: &str) -> VfsResult<Path> {
        self.require_folder(parent)?;
        let target = parent.join(name)?;
        if !target.is_child(parent) {
            return Err(VfsError::InvalidPath(format!(
                "'{}' does not name a folder below '{}'",
                name, parent
            )));
        }
        if LocalStore::is_service_path(&target) {
            return Err(VfsError::Forbidden(format!("'{}' is a reserved name", name)));
        }

        let mut first_created = None;
        for depth in parent.len() + 1..=target.len() {
            let level = target.sub_path_to(0, depth)?;
            match self.file_type(&level) {
                Some(FileType::Folder) => continue,
                Some(FileType::File) => {
                    return Err(VfsError::Forbidden(format!("'{}' is a file", level)))
                }
                None => {}
            }

            let _guard = self.lock_path(level.clone(), true)?;
            match fs::create_dir(self.store.native(&level)) {
                Ok(()) => {
                    first_created.get_or_insert(level);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if self.file_type(&level) != Some(FileType::Folder) {
                        return Err(VfsError::Forbidden(format!("'{}' is a file", level)));
                    }
                }
                Err(e) => return Err(VfsError::io(e, format!("create folder {}", level))),
            }
        }

        let created = first_created
            .ok_or_else(|| VfsError::Conflict(format!("folder '{}' already exists", target)))?;
        info!(path = %created, requested = %target, "folder created");
        self.notify(IndexTask::Add(self.indexed(&created, FileType::Folder)));
        Ok(created)
    }

    /// Direct children of a folder, sorted by name
    pub fn children(&self, folder: &Path) -> VfsResult<Vec<Path>> {
        self.require_folder(folder)?;
        self.store
            .list(folder)?
            .into_iter()
            .map(|(name, _)| folder.child(&name))
            .collect()
    }

    /// Existing descendant at `relative`, `None` when absent
    pub fn child(&self, folder: &Path, relative: &str) -> VfsResult<Option<Path>> {
        self.require_folder(folder)?;
        let path = folder.join(relative)?;
        if !path.is_child(folder) {
            return Err(VfsError::InvalidPath(format!(
                "'{}' does not name an item below '{}'",
                relative, folder
            )));
        }
        Ok(self.file_type(&path).map(|_| path))
    }

    /// Visit every descendant of `folder` breadth-first
    pub fn walk<F>(&self, folder: &Path, mut visit: F) -> VfsResult<()>
    where
        F: FnMut(&Path, FileType) -> VfsResult<()>,
    {
        self.require_folder(folder)?;
        let mut queue = VecDeque::from([folder.clone()]);
        while let Some(current) = queue.pop_front() {
            for (name, file_type) in self.store.list(&current)? {
                let child = current.child(&name)?;
                visit(&child, file_type)?;
                if file_type.is_folder() {
                    queue.push_back(child);
                }
            }
        }
        Ok(())
    }

    /// Copy an item into `dest_parent`, keeping its name unless `name` is given
    ///
    /// With `overwrite`, an existing target is removed first regardless of
    /// any lock it holds.
    pub fn copy(
        &self,
        source: &Path,
        dest_parent: &Path,
        name: Option<&str>,
        overwrite: bool,
    ) -> VfsResult<Path> {
        let file_type = self.file_type_of(source)?;
        let span = span_operation("copy", source);
        let _entered = span.enter();
        let target =
            span.observe(self.copy_unindexed(source, file_type, dest_parent, name, overwrite))?;

        info!(from = %source, to = %target, "item copied");
        self.notify(IndexTask::Add(self.indexed(&target, file_type)));
        Ok(target)
    }

    /// Move an item into `dest_parent`
    pub fn move_item(
        &self,
        source: &Path,
        dest_parent: &Path,
        name: Option<&str>,
        overwrite: bool,
        lock_token: Option<&str>,
    ) -> VfsResult<Path> {
        if source.is_root() {
            return Err(VfsError::Forbidden("the root folder cannot be moved".into()));
        }
        let file_type = self.file_type_of(source)?;
        let span = span_operation("move", source);
        let _entered = span.enter();
        let target = span.observe(
            ensure_not_into_self(source, dest_parent)
                .and_then(|()| self.check_mutable(source, file_type, lock_token))
                .and_then(|()| {
                    self.copy_unindexed(source, file_type, dest_parent, name, overwrite)
                }),
        )?;
        span.observe(self.remove_item(source, file_type))?;

        info!(from = %source, to = %target, "item moved");
        self.notify(IndexTask::Delete {
            path: source.clone(),
            is_file: file_type.is_file(),
        });
        self.notify(IndexTask::Add(self.indexed(&target, file_type)));
        Ok(target)
    }

    /// Rename an item in place
    pub fn rename(&self, path: &Path, new_name: &str, lock_token: Option<&str>) -> VfsResult<Path> {
        let parent = path
            .parent()
            .ok_or_else(|| VfsError::Forbidden("the root folder cannot be renamed".into()))?;
        self.move_item(path, &parent, Some(new_name), false, lock_token)
    }

    /// Delete an item with its side files
    pub fn delete(&self, path: &Path, lock_token: Option<&str>) -> VfsResult<()> {
        if path.is_root() {
            return Err(VfsError::Forbidden("the root folder cannot be deleted".into()));
        }
        let file_type = self.file_type_of(path)?;
        let span = span_operation("delete", path);
        let _entered = span.enter();
        span.observe(
            self.check_mutable(path, file_type, lock_token)
                .and_then(|()| self.remove_item(path, file_type)),
        )?;

        info!(path = %path, file_type = %file_type, "item deleted");
        self.notify(IndexTask::Delete {
            path: path.clone(),
            is_file: file_type.is_file(),
        });
        Ok(())
    }

    /// MD5 of every file in a subtree, as `(relative path, hex digest)` sorted by path
    ///
    /// A file yields a single entry named after itself.
    pub fn content_hashes(&self, path: &Path) -> VfsResult<Vec<(String, String)>> {
        if self.file_type_of(path)?.is_file() {
            return Ok(vec![(path.name().to_string(), self.md5_hex(path)?)]);
        }

        let mut hashes = Vec::new();
        self.walk(path, |child, file_type| {
            if file_type.is_file() {
                let relative = child.sub_path(path.len())?.to_relative_string();
                hashes.push((relative, self.md5_hex(child)?));
            }
            Ok(())
        })?;
        hashes.sort();
        Ok(hashes)
    }

    fn md5_hex(&self, path: &Path) -> VfsResult<String> {
        let _guard = self.lock_path(path.clone(), false)?;
        let mut file = File::open(self.store.native(path))
            .map_err(|e| VfsError::io(e, format!("open {}", path)))?;

        let mut context = md5::Context::new();
        let mut buf = [0u8; COPY_BUFFER_SIZE];
        loop {
            let n = file
                .read(&mut buf)
                .map_err(|e| VfsError::io(e, format!("read {}", path)))?;
            if n == 0 {
                break;
            }
            context.consume(&buf[..n]);
        }
        Ok(format!("{:x}", context.compute()))
    }

    fn copy_unindexed(
        &self,
        source: &Path,
        file_type: FileType,
        dest_parent: &Path,
        name: Option<&str>,
        overwrite: bool,
    ) -> VfsResult<Path> {
        self.require_folder(dest_parent)?;
        ensure_not_into_self(source, dest_parent)?;

        let name = name.unwrap_or_else(|| source.name());
        let target = self.checked_child(dest_parent, name)?;
        if &target == source {
            return Err(VfsError::Conflict(format!("'{}' cannot be copied onto itself", source)));
        }
        if source.is_child(&target) {
            return Err(VfsError::Forbidden(format!(
                "'{}' cannot replace its own ancestor '{}'",
                source, target
            )));
        }

        if let Some(existing) = self.file_type(&target) {
            if !overwrite {
                return Err(VfsError::Conflict(format!("item '{}' already exists", target)));
            }
            self.remove_item(&target, existing)?;
        }

        let _source_guard = self.lock_path(source.clone(), false)?;
        let _target_guard = self.lock_path(target.clone(), true)?;

        // Metadata first: a partial failure should not leave content without it
        let from = self.store.side_file(source, SideTree::Props);
        let to = self.store.side_file(&target, SideTree::Props);
        copy_side_file(&from, &to)
            .map_err(|e| VfsError::io(e, format!("copy properties of {}", source)))?;
        if file_type.is_folder() {
            let from = self.store.side_dir(source, SideTree::Props);
            let to = self.store.side_dir(&target, SideTree::Props);
            copy_side_dir(&from, &to)
                .map_err(|e| VfsError::io(e, format!("copy properties below {}", source)))?;
        }

        copy_tree(&self.store.native(source), &self.store.native(&target))
            .map_err(|e| VfsError::io(e, format!("copy {} to {}", source, target)))?;

        self.locks.remove(&target);
        self.props.remove(&target);
        Ok(target)
    }

    /// Remove content and side files, then drop every cached entry
    pub(crate) fn remove_item(&self, path: &Path, file_type: FileType) -> VfsResult<()> {
        {
            let _guard = self.lock_path(path.clone(), true)?;
            let native = self.store.native(path);
            let removed = match file_type {
                FileType::File => remove_file_if_exists(&native),
                FileType::Folder => remove_dir_if_exists(&native),
            };
            removed.map_err(|e| VfsError::io(e, format!("delete {}", path)))?;

            for tree in [SideTree::Props, SideTree::Locks] {
                let removed = remove_side_file(&self.store.side_file(path, tree));
                let removed = match file_type {
                    FileType::File => removed,
                    FileType::Folder => {
                        removed.and_then(|()| remove_side_dir(&self.store.side_dir(path, tree)))
                    }
                };
                removed.map_err(|e| VfsError::io(e, format!("delete side files of {}", path)))?;
            }
        }

        self.invalidate_caches();
        Ok(())
    }
}

/// A folder cannot be copied or moved into itself or one of its descendants
fn ensure_not_into_self(source: &Path, dest_parent: &Path) -> VfsResult<()> {
    if dest_parent == source || dest_parent.is_child(source) {
        return Err(VfsError::Forbidden(format!(
            "'{}' cannot be placed inside itself ('{}')",
            source, dest_parent
        )));
    }
    Ok(())
}
