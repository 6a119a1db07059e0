//! The generic query-store capability.
//!
//! [`QueryStore`] is the consumer-facing contract a UI or query layer codes
//! against: declarative queries, single-record reads, identity extraction,
//! and bulk/single-record writes. [`DocumentStoreAdapter`](crate::adapter::DocumentStoreAdapter)
//! implements it over a [`DocumentDatabase`](crate::database::DocumentDatabase).

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::StoreResult,
    query::{Expr, QueryOptions},
    results::QueryResults,
    view::BulkEntry,
};

/// A store that can be queried declaratively and mutated per record.
///
/// Every I/O method resolves or rejects exactly once; there are no partial
/// results, no retries, and no caching at this layer.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Runs a declarative query and resolves with the windowed result set.
    ///
    /// A store with no backing database resolves with an empty result
    /// rather than failing.
    async fn query(&self, filter: Option<Expr>, options: QueryOptions)
    -> StoreResult<QueryResults>;

    /// Fetches one record by identity.
    async fn get(&self, id: &str) -> StoreResult<Value>;

    /// Extracts a record's identity per the store's configured identity
    /// field. Pure; `None` when the record has no such field.
    fn get_identity<'a>(&self, record: &'a Value) -> Option<&'a Value>;

    /// Bulk-inserts records, surfacing the backend's per-record outcomes.
    async fn set_data(&self, records: Vec<Value>) -> StoreResult<Vec<BulkEntry>>;

    /// Creates or replaces a record, keyed by its identity field. Returns
    /// the new revision.
    async fn put(&self, record: Value) -> StoreResult<String>;

    /// Creates a record, keyed by its identity field; a record with that
    /// identity must not already exist. Returns the new revision.
    async fn add(&self, record: Value) -> StoreResult<String>;

    /// Deletes the record with the given identity.
    async fn remove(&self, id: &str) -> StoreResult<()>;
}
