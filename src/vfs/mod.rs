/*!
 * Virtual File System Module
 * Local-disk VFS: paths, handles, side files and the mount point
 */

pub mod config;
pub mod content;
pub(crate) mod local;
pub mod lock;
pub mod mount;
pub mod path;
pub mod properties;
pub mod types;
pub mod virtual_file;

// Re-exports
pub use config::MountConfig;
pub use content::ContentStream;
pub use lock::FileLock;
pub use mount::{MountPoint, MountPointBuilder, PathLockFactory};
pub use path::Path;
pub use properties::Properties;
pub use types::{ErrorKind, FileType, VfsError, VfsResult};
pub use virtual_file::VirtualFile;
