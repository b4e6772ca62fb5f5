/*!
 * VFS Error Types
 * Structured, type-safe error handling for mount point operations
 */

use miette::Diagnostic;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// VFS operation result
///
/// # Must Use
/// VFS operations can fail and must be handled to prevent data loss
#[must_use = "VFS operations can fail and must be handled"]
pub type VfsResult<T> = Result<T, VfsError>;

/// The four classes the REST layer maps errors onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    ServerError,
}

/// VFS errors with structured, type-safe error handling
///
/// All error variants include context strings that should be non-empty.
/// Serialization uses tagged enum pattern for type safety.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum VfsError {
    #[error("Not found: {0}")]
    #[diagnostic(code(vfs::not_found))]
    NotFound(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Forbidden: {0}")]
    #[diagnostic(
        code(vfs::forbidden),
        help("The item may be locked, be the mount root, or have the wrong type for this operation.")
    )]
    Forbidden(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Conflict: {0}")]
    #[diagnostic(code(vfs::conflict))]
    Conflict(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid path: {0}")]
    #[diagnostic(
        code(vfs::invalid_path),
        help("Paths are '/'-separated names without empty elements.")
    )]
    InvalidPath(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Timed out: {0}")]
    #[diagnostic(code(vfs::timeout))]
    Timeout(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Server error: {0}")]
    #[diagnostic(code(vfs::server_error), help("Check the logs for the underlying I/O failure."))]
    ServerError(#[serde(deserialize_with = "deserialize_nonempty_string")] String),
}

impl VfsError {
    /// Collapse into one of the four externally visible classes
    pub const fn kind(&self) -> ErrorKind {
        match self {
            VfsError::NotFound(_) => ErrorKind::NotFound,
            VfsError::Forbidden(_) | VfsError::InvalidPath(_) => ErrorKind::Forbidden,
            VfsError::Conflict(_) => ErrorKind::Conflict,
            VfsError::Timeout(_) | VfsError::ServerError(_) => ErrorKind::ServerError,
        }
    }

    /// Convert std::io::Error to VfsError with operation context
    pub fn io(e: std::io::Error, context: impl Into<String>) -> Self {
        use std::io::ErrorKind as IoKind;
        match e.kind() {
            IoKind::NotFound => VfsError::NotFound(context.into()),
            IoKind::AlreadyExists => VfsError::Conflict(context.into()),
            _ => VfsError::ServerError(format!("{}: {}", context.into(), e)),
        }
    }
}

impl From<crate::core::codec::CodecError> for VfsError {
    fn from(err: crate::core::codec::CodecError) -> Self {
        VfsError::ServerError(err.to_string())
    }
}

impl From<zip::result::ZipError> for VfsError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => VfsError::io(e, "zip archive"),
            other => VfsError::ServerError(format!("zip archive: {}", other)),
        }
    }
}

/// Deserialize and validate non-empty string for error messages
pub(super) fn deserialize_nonempty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Err(serde::de::Error::custom("error message must not be empty"));
    }
    Ok(s)
}
