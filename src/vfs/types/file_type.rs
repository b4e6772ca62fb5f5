/*!
 * VFS Item Type
 * A mount point only holds regular files and folders
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Item type with serde support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    File,
    Folder,
}

impl FileType {
    /// Classify a native file type; anything that is not a directory is content
    pub(crate) fn from_native(ft: std::fs::FileType) -> Self {
        if ft.is_dir() {
            FileType::Folder
        } else {
            FileType::File
        }
    }

    #[inline]
    pub const fn is_file(self) -> bool {
        matches!(self, FileType::File)
    }

    #[inline]
    pub const fn is_folder(self) -> bool {
        matches!(self, FileType::Folder)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileType::File => write!(f, "file"),
            FileType::Folder => write!(f, "folder"),
        }
    }
}
