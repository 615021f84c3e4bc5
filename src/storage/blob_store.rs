//! Blob store client - fetch raw payloads by reference

use std::path::Path;
use std::time::Duration;
use rusqlite::{Connection, OptionalExtension};
use crate::reference::BlobRef;
use crate::{Error, Result};

/// Read-only client for the blob database
pub struct BlobStore {
    conn: Connection,
}

impl BlobStore {
    /// Open the blob database read-only
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = super::open_read_only(path, busy_timeout)?;
        tracing::debug!("Opened blob store {}", path.display());
        Ok(Self { conn })
    }

    /// Wrap an already opened connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Fetch the payload bytes behind `reference`
    pub fn fetch(&self, reference: BlobRef) -> Result<Vec<u8>> {
        let mut stmt = self.conn.prepare_cached("SELECT data FROM blobs WHERE id = ?1")?;
        let data: Option<Vec<u8>> = stmt
            .query_row([reference.id()], |row| row.get(0))
            .optional()?;

        data.ok_or_else(|| Error::NotFound(reference.to_string()))
    }
}
