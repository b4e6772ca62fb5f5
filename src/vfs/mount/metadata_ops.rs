/*!
 * Metadata Operations
 * Lazily loaded, copy-modify-save property maps
 */

use std::fs::{self, File};
use std::io::BufReader;

use tracing::debug;

use super::MountPoint;
use crate::vfs::local::{remove_side_file, LocalStore, SideTree};
use crate::vfs::path::Path;
use crate::vfs::properties::Properties;
use crate::vfs::types::{FileType, VfsError, VfsResult};

impl MountPoint {
    /// Properties of an existing item; empty when none were ever set
    pub fn properties(&self, path: &Path) -> VfsResult<Properties> {
        self.file_type_of(path)?;
        if let Some(props) = self.props.get(path) {
            return Ok(props);
        }

        let _guard = self.lock_path(LocalStore::side_key(path, SideTree::Props), false)?;
        let props = self.read_props_file(path)?;
        self.props.put(path.clone(), props.clone());
        Ok(props)
    }

    /// Merge `updates` into an item's properties; empty value lists remove
    ///
    /// Locked files only accept updates carrying the lock token.
    pub fn update_properties(
        &self,
        path: &Path,
        updates: &Properties,
        lock_token: Option<&str>,
    ) -> VfsResult<()> {
        if self.file_type_of(path)? == FileType::File {
            self.validate_lock_token(path, lock_token)?;
        }
        self.modify_properties(path, |props| props.merge(updates))
    }

    /// Set or, with `None`, remove a single property
    pub fn set_property(&self, path: &Path, name: &str, value: Option<&str>) -> VfsResult<()> {
        if self.file_type_of(path)? == FileType::File {
            self.validate_lock_token(path, None)?;
        }
        self.modify_properties(path, |props| props.set(name, value))
    }

    fn modify_properties<F>(&self, path: &Path, modify: F) -> VfsResult<()>
    where
        F: FnOnce(&mut Properties),
    {
        let _guard = self.lock_path(LocalStore::side_key(path, SideTree::Props), true)?;

        let mut props = match self.props.get(path) {
            Some(cached) => cached,
            None => self.read_props_file(path)?,
        };
        modify(&mut props);
        self.write_props_file(path, &props)?;

        debug!(path = %path, entries = props.len(), "properties saved");
        self.props.put(path.clone(), props);
        Ok(())
    }

    fn read_props_file(&self, path: &Path) -> VfsResult<Properties> {
        let side = self.store.side_file(path, SideTree::Props);
        if side.is_dir() {
            // Side directory of a folder whose name carries the suffix
            return Ok(Properties::new());
        }
        match File::open(&side) {
            Ok(file) => Properties::read_from(BufReader::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Properties::new()),
            Err(e) => Err(VfsError::io(e, format!("read properties of {}", path))),
        }
    }

    /// An empty map removes the side file
    fn write_props_file(&self, path: &Path, props: &Properties) -> VfsResult<()> {
        let side = self.store.side_file(path, SideTree::Props);
        if props.is_empty() {
            return remove_side_file(&side)
                .map_err(|e| VfsError::io(e, format!("remove properties of {}", path)));
        }

        if let Some(dir) = side.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| VfsError::io(e, format!("properties dir of {}", path)))?;
        }
        let mut buf = Vec::new();
        props.write_to(&mut buf)?;
        fs::write(&side, buf).map_err(|e| VfsError::io(e, format!("write properties of {}", path)))
    }
}
