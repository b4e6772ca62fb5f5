/*!
 * Content Streams
 * File content handed back to callers after the path lock is released
 */

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

use crate::core::limits::COPY_BUFFER_SIZE;

/// Readable content
///
/// Small content is buffered in memory. Larger content is copied into an
/// anonymous temporary file which the OS removes once the stream is dropped.
#[derive(Debug)]
pub enum ContentStream {
    Memory(Cursor<Vec<u8>>),
    Spooled { file: File, len: u64 },
}

impl ContentStream {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        ContentStream::Memory(Cursor::new(bytes))
    }

    /// Copy `reader` into a fresh temporary file and rewind it
    pub fn spool<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut file = tempfile::tempfile()?;
        let len = copy_buffered(reader, &mut file)?;
        file.seek(SeekFrom::Start(0))?;
        Ok(ContentStream::Spooled { file, len })
    }

    /// Read `len` bytes from `reader` into memory or a spool file, whichever
    /// `threshold` selects
    pub fn capture<R: Read>(reader: &mut R, len: u64, threshold: u64) -> io::Result<Self> {
        if len < threshold {
            let mut buf = Vec::with_capacity(len as usize);
            reader.read_to_end(&mut buf)?;
            Ok(Self::from_bytes(buf))
        } else {
            Self::spool(reader)
        }
    }

    /// Total content length in bytes
    pub fn len(&self) -> u64 {
        match self {
            ContentStream::Memory(cursor) => cursor.get_ref().len() as u64,
            ContentStream::Spooled { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_spooled(&self) -> bool {
        matches!(self, ContentStream::Spooled { .. })
    }

    /// Drain the remaining content into a vector
    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self {
            ContentStream::Memory(cursor) if cursor.position() == 0 => Ok(cursor.into_inner()),
            mut other => {
                let mut buf = Vec::with_capacity(other.len() as usize);
                other.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

impl Read for ContentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ContentStream::Memory(cursor) => cursor.read(buf),
            ContentStream::Spooled { file, .. } => file.read(buf),
        }
    }
}

/// `io::copy` with a fixed-size buffer, returning the byte count
pub(crate) fn copy_buffered<R: Read + ?Sized, W: io::Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
) -> io::Result<u64> {
    let mut buf = [0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
}
