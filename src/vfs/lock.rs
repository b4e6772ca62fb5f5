/*!
 * File Locks
 * Advisory lock value object and its on-disk descriptor
 */

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::core::codec;
use crate::core::limits::LOCK_NEVER_EXPIRES;

use super::types::VfsResult;

/// Milliseconds since the Unix epoch
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Lock held on a single file
///
/// `FileLock::NONE` is the canonical unlocked value and is cached like any
/// other lock so repeated `is_locked` checks skip the descriptor file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLock {
    token: String,
    expires_at: u64,
}

impl FileLock {
    /// The unlocked state
    pub const NONE: FileLock = FileLock {
        token: String::new(),
        expires_at: 0,
    };

    /// New lock with a random token
    ///
    /// A zero timeout produces a lock that never expires.
    pub fn generate(timeout: Duration) -> Self {
        let expires_at = if timeout.is_zero() {
            LOCK_NEVER_EXPIRES
        } else {
            now_millis().saturating_add(timeout.as_millis() as u64)
        };
        Self {
            token: uuid::Uuid::new_v4().to_string(),
            expires_at,
        }
    }

    #[inline]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Absolute expiry in epoch milliseconds; `u64::MAX` means never
    #[inline]
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.token.is_empty()
    }

    /// A lock past its expiry is logically absent
    #[inline]
    pub fn is_expired_at(&self, now: u64) -> bool {
        !self.is_none() && self.expires_at != LOCK_NEVER_EXPIRES && self.expires_at <= now
    }

    /// Held and not expired
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_none() && !self.is_expired_at(now_millis())
    }

    /// Write the descriptor: length-prefixed token, then 64-bit expiry
    pub fn write_descriptor<W: Write>(&self, writer: W) -> VfsResult<()> {
        codec::write_to(writer, self)?;
        Ok(())
    }

    pub fn read_descriptor<R: Read>(reader: R) -> VfsResult<Self> {
        Ok(codec::read_from(reader)?)
    }
}
