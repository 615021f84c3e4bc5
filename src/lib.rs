//! # ensemble-graph - Query-graph access layer for simulation ensembles
//!
//! Ensembles, realizations, responses, observations and parameters live in a
//! relational entity store. Their numeric payloads (time series, index axes,
//! parameter values) live out-of-line in a separate blob store and are held
//! by the entities as opaque references.
//!
//! ensemble-graph provides:
//! - Read-only entity store with lookup-by-id and filter primitives
//! - Blob store client and a reference resolver decoding packed numeric arrays
//! - Derived-field rules (definition names, update sources, observation links)
//! - A query engine executing field-selection documents against a [`query::Session`]

pub mod entity;
pub mod reference;
pub mod storage;
pub mod query;
pub mod config;
pub mod server;
pub mod ui;

// Re-exports for convenient access
pub use config::GraphConfig;
pub use entity::Entity;
pub use query::{QueryEngine, Request, Response, Session};
pub use reference::{BlobRef, ElementType, NumericArray};
pub use storage::{BlobStore, EntityStore};

use rusqlite::ErrorCode;

/// Result type alias for ensemble-graph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ensemble-graph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("Query error: {0}")]
    Query(String),
}

impl Error {
    /// Stable machine-readable code attached to query errors
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NOT_FOUND",
            Error::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Error::Decode(_) => "DECODE_ERROR",
            Error::Storage(_) => "STORAGE_ERROR",
            Error::Query(_) => "QUERY_ERROR",
        }
    }
}

impl From<rusqlite::Error> for Error {
    /// Connection-level failures (cannot open, busy past the timeout, locked,
    /// not a database) are reported as an unavailable store.
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase,
            ) => Error::StoreUnavailable(err.to_string()),
            _ => Error::Storage(err),
        }
    }
}
