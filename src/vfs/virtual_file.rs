/*!
 * Virtual File
 * Handle for one file or folder of a mount point
 *
 * A handle carries only its path and a borrow of the mount point. Existence,
 * type, content and properties are re-read on every call.
 */

use std::fmt;
use std::io::Read;
use std::time::{Duration, SystemTime};

use super::content::ContentStream;
use super::mount::MountPoint;
use super::path::Path;
use super::properties::Properties;
use super::types::{FileType, VfsError, VfsResult};

#[derive(Clone)]
pub struct VirtualFile<'m> {
    path: Path,
    mount: &'m MountPoint,
}

impl<'m> VirtualFile<'m> {
    pub(crate) fn new(path: Path, mount: &'m MountPoint) -> Self {
        Self { path, mount }
    }

    fn at(&self, path: Path) -> VirtualFile<'m> {
        VirtualFile::new(path, self.mount)
    }

    // Identity and navigation

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.path.name()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    pub fn mount_point(&self) -> &'m MountPoint {
        self.mount
    }

    pub fn exists(&self) -> bool {
        self.mount.file_type(&self.path).is_some()
    }

    pub fn file_type(&self) -> VfsResult<FileType> {
        self.mount.file_type_of(&self.path)
    }

    pub fn is_file(&self) -> bool {
        self.mount.file_type(&self.path) == Some(FileType::File)
    }

    pub fn is_folder(&self) -> bool {
        self.mount.file_type(&self.path) == Some(FileType::Folder)
    }

    /// Parent folder, `None` for the root
    pub fn parent(&self) -> Option<VirtualFile<'m>> {
        self.path.parent().map(|p| self.at(p))
    }

    pub fn children(&self) -> VfsResult<Vec<VirtualFile<'m>>> {
        Ok(self
            .mount
            .children(&self.path)?
            .into_iter()
            .map(|p| self.at(p))
            .collect())
    }

    pub fn child(&self, relative: &str) -> VfsResult<Option<VirtualFile<'m>>> {
        Ok(self.mount.child(&self.path, relative)?.map(|p| self.at(p)))
    }

    /// Breadth-first visit of every descendant
    pub fn walk<F>(&self, mut visit: F) -> VfsResult<()>
    where
        F: FnMut(&VirtualFile<'m>) -> VfsResult<()>,
    {
        self.mount
            .walk(&self.path, |path, _| visit(&self.at(path.clone())))
    }

    // Attributes and content

    pub fn length(&self) -> VfsResult<u64> {
        self.mount.length(&self.path)
    }

    pub fn last_modified(&self) -> VfsResult<SystemTime> {
        self.mount.last_modified(&self.path)
    }

    pub fn get_content(&self) -> VfsResult<ContentStream> {
        self.mount.get_content(&self.path)
    }

    pub fn update_content(
        &self,
        content: &mut dyn Read,
        lock_token: Option<&str>,
    ) -> VfsResult<()> {
        self.mount.update_content(&self.path, content, lock_token)
    }

    pub fn content_hashes(&self) -> VfsResult<Vec<(String, String)>> {
        self.mount.content_hashes(&self.path)
    }

    // Properties

    pub fn get_properties(&self) -> VfsResult<Properties> {
        self.mount.properties(&self.path)
    }

    pub fn get_property(&self, name: &str) -> VfsResult<Option<String>> {
        Ok(self.get_properties()?.get(name).map(str::to_string))
    }

    pub fn get_property_values(&self, name: &str) -> VfsResult<Vec<String>> {
        Ok(self
            .get_properties()?
            .get_all(name)
            .map(<[String]>::to_vec)
            .unwrap_or_default())
    }

    pub fn set_property(&self, name: &str, value: Option<&str>) -> VfsResult<()> {
        self.mount.set_property(&self.path, name, value)
    }

    pub fn update_properties(
        &self,
        updates: &Properties,
        lock_token: Option<&str>,
    ) -> VfsResult<()> {
        self.mount.update_properties(&self.path, updates, lock_token)
    }

    // Structure

    pub fn create_file(
        &self,
        name: &str,
        content: Option<&mut dyn Read>,
    ) -> VfsResult<VirtualFile<'m>> {
        let path = self.mount.create_file(&self.path, name, content)?;
        Ok(self.at(path))
    }

    /// See [`MountPoint::create_folder`]; returns the first created level
    pub fn create_folder(&self, name: &str) -> VfsResult<VirtualFile<'m>> {
        let path = self.mount.create_folder(&self.path, name)?;
        Ok(self.at(path))
    }

    pub fn copy_to(&self, parent: &VirtualFile<'_>) -> VfsResult<VirtualFile<'m>> {
        self.copy_to_named(parent, None, false)
    }

    pub fn copy_to_named(
        &self,
        parent: &VirtualFile<'_>,
        name: Option<&str>,
        overwrite: bool,
    ) -> VfsResult<VirtualFile<'m>> {
        self.same_mount(parent)?;
        let path = self.mount.copy(&self.path, &parent.path, name, overwrite)?;
        Ok(self.at(path))
    }

    pub fn move_to(
        &self,
        parent: &VirtualFile<'_>,
        lock_token: Option<&str>,
    ) -> VfsResult<VirtualFile<'m>> {
        self.move_to_named(parent, None, false, lock_token)
    }

    pub fn move_to_named(
        &self,
        parent: &VirtualFile<'_>,
        name: Option<&str>,
        overwrite: bool,
        lock_token: Option<&str>,
    ) -> VfsResult<VirtualFile<'m>> {
        self.same_mount(parent)?;
        let path = self
            .mount
            .move_item(&self.path, &parent.path, name, overwrite, lock_token)?;
        Ok(self.at(path))
    }

    pub fn rename(&self, new_name: &str, lock_token: Option<&str>) -> VfsResult<VirtualFile<'m>> {
        let path = self.mount.rename(&self.path, new_name, lock_token)?;
        Ok(self.at(path))
    }

    pub fn delete(&self, lock_token: Option<&str>) -> VfsResult<()> {
        self.mount.delete(&self.path, lock_token)
    }

    // Locks

    pub fn lock(&self, timeout: Duration) -> VfsResult<String> {
        self.mount.lock_file(&self.path, timeout)
    }

    pub fn unlock(&self, token: &str) -> VfsResult<()> {
        self.mount.unlock_file(&self.path, token)
    }

    pub fn is_locked(&self) -> VfsResult<bool> {
        self.mount.is_locked(&self.path)
    }

    // Archives

    pub fn zip(&self) -> VfsResult<ContentStream> {
        self.mount.zip(&self.path)
    }

    pub fn unzip<R: Read>(
        &self,
        archive: R,
        overwrite: bool,
        skip_first_levels: usize,
    ) -> VfsResult<()> {
        self.mount.unzip(&self.path, archive, overwrite, skip_first_levels)
    }

    fn same_mount(&self, other: &VirtualFile<'_>) -> VfsResult<()> {
        if std::ptr::eq(self.mount, other.mount) {
            Ok(())
        } else {
            Err(VfsError::Forbidden(format!(
                "'{}' belongs to a different mount point",
                other.path
            )))
        }
    }
}

impl PartialEq for VirtualFile<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && std::ptr::eq(self.mount, other.mount)
    }
}

impl Eq for VirtualFile<'_> {}

impl fmt::Debug for VirtualFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualFile({})", self.path)
    }
}

impl fmt::Display for VirtualFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path, f)
    }
}
