//! Document database capability traits.
//!
//! This module defines the seam between the store adapter and whatever
//! actually holds the documents. A [`DocumentDatabase`] is one named
//! database: it can be scanned, queried through named views, read by id,
//! and written to in bulk or per document. A [`DatabaseConnector`] opens
//! databases by name with open-or-create semantics, so the adapter never
//! reaches for an ambient connection factory.
//!
//! # Thread safety
//!
//! All implementations must be `Send + Sync`; the adapter shares its handle
//! across concurrent async tasks. All methods are async and return
//! [`StoreResult`](crate::error::StoreResult); implementations forward
//! their native errors through [`StoreError::Backend`](crate::error::StoreError),
//! reserving the dedicated variants for not-found and conflict outcomes.

use async_trait::async_trait;
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::StoreResult,
    view::{BulkEntry, ViewOptions, ViewResponse},
};

/// One named document database.
///
/// The read side mirrors the backing protocol: full scans and view
/// invocations both answer with a [`ViewResponse`] row sequence, single
/// documents come back as JSON values. The write side offers a bulk insert
/// with per-document outcomes plus the single-document primitives the
/// store-level mutation operations translate to.
#[async_trait]
pub trait DocumentDatabase: Send + Sync + Debug {
    /// The database name this handle is bound to.
    fn name(&self) -> &str;

    /// Fetches every document as a row sequence ordered by document id.
    ///
    /// Row `value` carries the revision stub; the document itself is
    /// attached as `doc` when `options.include_docs` is set. Key-range and
    /// window options are interpreted against document ids.
    async fn fetch_all(&self, options: ViewOptions) -> StoreResult<ViewResponse>;

    /// Invokes the named view with the given options.
    ///
    /// # Errors
    ///
    /// [`StoreError::ViewNotFound`](crate::error::StoreError::ViewNotFound)
    /// when no view of that name exists.
    async fn query_view(&self, view: &str, options: ViewOptions) -> StoreResult<ViewResponse>;

    /// Fetches a single document by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`](crate::error::StoreError::NotFound) when the
    /// id does not exist.
    async fn get_by_id(&self, id: &str) -> StoreResult<Value>;

    /// Writes a batch of records, creating ids for records that lack one.
    ///
    /// Individual failures (typically revision conflicts) do not abort the
    /// batch; every record gets an entry in the returned sequence, in input
    /// order.
    async fn bulk_insert(&self, records: Vec<Value>) -> StoreResult<Vec<BulkEntry>>;

    /// Creates or replaces the document stored under `id`, returning the new
    /// revision. Replacing requires the record's revision to match the
    /// stored one.
    async fn put_document(&self, id: &str, record: Value) -> StoreResult<String>;

    /// Creates the document stored under `id`, returning its revision.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`](crate::error::StoreError::Conflict) when a
    /// document with that id already exists.
    async fn insert_document(&self, id: &str, record: Value) -> StoreResult<String>;

    /// Deletes the document stored under `id`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`](crate::error::StoreError::NotFound) when the
    /// id does not exist.
    async fn delete_document(&self, id: &str) -> StoreResult<()>;
}

/// Opens databases by name.
///
/// Connectors are injected into the adapter so that name targets resolve
/// through an explicit capability. Opening a name that does not exist yet
/// creates the database.
#[async_trait]
pub trait DatabaseConnector: Send + Sync + Debug {
    /// Opens (or creates) the database called `name`.
    async fn open(&self, name: &str) -> StoreResult<Arc<dyn DocumentDatabase>>;
}

/// A database target: either a name to resolve through a connector, or an
/// already-open handle.
#[derive(Debug, Clone)]
pub enum Target {
    /// A database name; binding it requires a connector.
    Name(String),
    /// An open database handle, stored as-is.
    Handle(Arc<dyn DocumentDatabase>),
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Name(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Name(name)
    }
}

impl From<Arc<dyn DocumentDatabase>> for Target {
    fn from(handle: Arc<dyn DocumentDatabase>) -> Self {
        Target::Handle(handle)
    }
}
