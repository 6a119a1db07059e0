//! Error types and result types for store and database operations.
//!
//! This module provides the error taxonomy shared by the adapter, the query
//! engine, and database backends. Use [`StoreResult<T>`] as the return type
//! for fallible operations.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors surfaced by the store adapter and its
/// backing database.
///
/// Backend failures are forwarded as-is inside the [`Backend`](StoreError::Backend)
/// variant; the adapter performs no retries and no reclassification.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Serialization/deserialization error when converting records or
    /// responses to and from JSON.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Error while opening a database or configuring the adapter.
    #[error("initialization error: {0}")]
    Initialization(String),
    /// The requested document was not found. The argument is the document id.
    #[error("document not found: {0}")]
    NotFound(String),
    /// A write clashed with an existing document or a newer revision.
    #[error("document conflict: {0}")]
    Conflict(String),
    /// The record does not satisfy the store's structural requirements
    /// (e.g. a mutation on a record with no identity field).
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// The database returned a response the adapter could not interpret.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The named view does not exist in the database.
    #[error("view not found: {0}")]
    ViewNotFound(String),
    /// An error reported by the underlying database, forwarded verbatim.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
