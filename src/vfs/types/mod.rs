/*!
 * VFS Types
 * Shared types for mount point operations
 */

mod errors;
mod file_type;

pub use errors::{ErrorKind, VfsError, VfsResult};
pub use file_type::FileType;
