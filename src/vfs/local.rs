/*!
 * Local Store
 * Maps mount paths and their side files onto the native filesystem
 */

use std::collections::VecDeque;
use std::fs;
use std::path::{Path as NativePath, PathBuf};

use super::path::Path;
use super::types::{FileType, VfsError, VfsResult};
use crate::core::limits::{
    LOCKS_DIR, LOCK_FILE_SUFFIX, PROPS_DIR, PROPS_FILE_SUFFIX, SERVICE_DIR,
};

/// Which side-file tree an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SideTree {
    Locks,
    Props,
}

impl SideTree {
    const fn dir(self) -> &'static str {
        match self {
            SideTree::Locks => LOCKS_DIR,
            SideTree::Props => PROPS_DIR,
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            SideTree::Locks => LOCK_FILE_SUFFIX,
            SideTree::Props => PROPS_FILE_SUFFIX,
        }
    }
}

/// Native layout of one mount point
///
/// ```text
/// <root>/a/b.txt                    content
/// <root>/.vfs/locks/a/b.txt_lock    lock descriptor
/// <root>/.vfs/props/a/b.txt_props   metadata
/// ```
#[derive(Debug, Clone)]
pub(crate) struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open `root`, creating it and the service directories if missing
    pub fn open(root: PathBuf) -> VfsResult<Self> {
        for tree in [SideTree::Locks, SideTree::Props] {
            let dir = root.join(SERVICE_DIR).join(tree.dir());
            fs::create_dir_all(&dir)
                .map_err(|e| VfsError::io(e, format!("create {}", dir.display())))?;
        }
        Ok(Self { root })
    }

    #[inline]
    pub fn root(&self) -> &NativePath {
        &self.root
    }

    /// Native location of an item's content
    pub fn native(&self, path: &Path) -> PathBuf {
        let mut native = self.root.clone();
        native.extend(path.elements());
        native
    }

    /// True for paths inside the hidden service directory
    pub fn is_service_path(path: &Path) -> bool {
        path.elements().first().map(String::as_str) == Some(SERVICE_DIR)
    }

    /// Logical key of an item's side file, used with the path lock factory
    ///
    /// Keys live under the service directory, so they never collide with
    /// item paths and locking a side file never blocks the item itself.
    pub fn side_key(path: &Path, tree: SideTree) -> Path {
        let mut elements = Vec::with_capacity(path.len() + 2);
        elements.push(SERVICE_DIR.to_string());
        elements.push(tree.dir().to_string());
        if let Some((_, parents)) = path.elements().split_last() {
            elements.extend_from_slice(parents);
        }
        elements.push(format!("{}{}", path.name(), tree.suffix()));
        Path::from_trusted(elements)
    }

    /// Native location of an item's side file
    pub fn side_file(&self, path: &Path, tree: SideTree) -> PathBuf {
        self.native(&Self::side_key(path, tree))
    }

    /// Native directory holding the side files of an item's descendants
    pub fn side_dir(&self, path: &Path, tree: SideTree) -> PathBuf {
        let mut dir = self.root.join(SERVICE_DIR).join(tree.dir());
        dir.extend(path.elements());
        dir
    }

    /// Type of the item at `path`, `None` when absent
    pub fn file_type(&self, path: &Path) -> Option<FileType> {
        if Self::is_service_path(path) {
            return None;
        }
        fs::metadata(self.native(path))
            .ok()
            .map(|md| FileType::from_native(md.file_type()))
    }

    /// Child names of a folder, sorted, service directory excluded
    pub fn list(&self, path: &Path) -> VfsResult<Vec<(String, FileType)>> {
        let native = self.native(path);
        let entries = fs::read_dir(&native)
            .map_err(|e| VfsError::io(e, format!("list {}", path)))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VfsError::io(e, format!("read entry in {}", path)))?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(parent = %path, name = ?raw, "skipping non UTF-8 name");
                    continue;
                }
            };
            if path.is_root() && name == SERVICE_DIR {
                continue;
            }
            let file_type = entry
                .file_type()
                .map_err(|e| VfsError::io(e, format!("stat {}/{}", path, name)))?;
            result.push((name, FileType::from_native(file_type)));
        }

        result.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(result)
    }
}

/// Remove a file, treating "already gone" as success
pub(crate) fn remove_file_if_exists(native: &NativePath) -> std::io::Result<()> {
    match fs::remove_file(native) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Remove a directory tree, treating "already gone" as success
pub(crate) fn remove_dir_if_exists(native: &NativePath) -> std::io::Result<()> {
    match fs::remove_dir_all(native) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Copy a file or directory tree, breadth-first with an explicit queue
pub(crate) fn copy_tree(from: &NativePath, to: &NativePath) -> std::io::Result<()> {
    if !from.is_dir() {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to)?;
        return Ok(());
    }

    let mut queue = VecDeque::from([(from.to_path_buf(), to.to_path_buf())]);
    while let Some((src, dst)) = queue.pop_front() {
        fs::create_dir_all(&dst)?;
        for entry in fs::read_dir(&src)? {
            let entry = entry?;
            let target = dst.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                queue.push_back((entry.path(), target));
            } else {
                fs::copy(entry.path(), target)?;
            }
        }
    }
    Ok(())
}

// A side file `<name>_props` and the side directory of a sibling folder
// literally named `<name>_props` share one native location. The helpers below
// only touch the slot when it holds the expected kind of entry.

/// Remove a side file, leaving a colliding side directory alone
pub(crate) fn remove_side_file(native: &NativePath) -> std::io::Result<()> {
    if native.is_dir() {
        return Ok(());
    }
    remove_file_if_exists(native)
}

/// Remove a side directory, leaving a colliding side file alone
pub(crate) fn remove_side_dir(native: &NativePath) -> std::io::Result<()> {
    if !native.is_dir() {
        return Ok(());
    }
    remove_dir_if_exists(native)
}

/// Copy a side file if one exists
pub(crate) fn copy_side_file(from: &NativePath, to: &NativePath) -> std::io::Result<()> {
    if from.is_file() {
        copy_tree(from, to)
    } else {
        Ok(())
    }
}

/// Copy a side directory if one exists
pub(crate) fn copy_side_dir(from: &NativePath, to: &NativePath) -> std::io::Result<()> {
    if from.is_dir() {
        copy_tree(from, to)
    } else {
        Ok(())
    }
}
