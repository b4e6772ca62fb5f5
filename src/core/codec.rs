/*!
 * Side-File Codec
 * Binary serialization for lock descriptors and metadata files
 *
 * bincode's default encoding writes every string and sequence with a
 * little-endian u64 length prefix, so a `String` field is length-prefixed and a
 * map is count-prefixed followed by its `(key, value)` records.
 */

use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Binary serialization errors
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Serialize straight into a writer
pub fn write_to<W: Write, T: Serialize>(writer: W, value: &T) -> CodecResult<()> {
    bincode::serialize_into(writer, value).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Deserialize straight from a reader
pub fn read_from<R: Read, T: DeserializeOwned>(reader: R) -> CodecResult<T> {
    bincode::deserialize_from(reader).map_err(|e| CodecError::Deserialization(e.to_string()))
}
