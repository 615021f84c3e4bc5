//! Storage Layer - read-only SQLite access to both stores
//!
//! The entity store (system of record for metadata) holds tables:
//! - projects, ensembles, updates, realizations
//! - response_definitions, responses, observations, observation_response_definition_links
//! - parameter_definitions, parameters, parameter_priors
//!
//! The blob store is a separate database holding `blobs(id, data)`.
//! The two are never assumed to be co-located.

pub mod schema;
pub mod entity_store;
pub mod blob_store;

pub use entity_store::{EntityStore, Filter, StoreStats};
pub use blob_store::BlobStore;

use std::path::Path;
use std::time::Duration;
use rusqlite::{Connection, OpenFlags};
use crate::{Error, Result};

/// Open a read-only connection that fails fast once `busy_timeout` elapses.
///
/// A missing database file is reported as [`Error::StoreUnavailable`].
pub(crate) fn open_read_only(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
        | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(path, flags).map_err(|err| {
        Error::StoreUnavailable(format!("{}: {}", path.display(), err))
    })?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}
