//! The document-store adapter.
//!
//! [`DocumentStoreAdapter`] implements the generic [`QueryStore`] contract
//! over a [`DocumentDatabase`]: it translates declarative store queries into
//! either a full scan or an invocation of the database view it is bound to,
//! flattens the raw row response into records, and hands those to its query
//! engine for filtering, sorting, and windowing.
//!
//! # Example
//!
//! ```ignore
//! use docbridge_core::{adapter::DocumentStoreAdapter, query::{Filter, QueryOptions}};
//!
//! let adapter = DocumentStoreAdapter::builder()
//!     .connector(connector)
//!     .target("people")
//!     .id_property("_id")
//!     .build()
//!     .await?;
//!
//! let results = adapter
//!     .query(Some(Filter::eq("name", "y")), QueryOptions::new())
//!     .await?;
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::{
    database::{DatabaseConnector, DocumentDatabase, Target},
    engine::{MemoryQueryEngine, QueryEngine},
    error::{StoreError, StoreResult},
    query::{Expr, QueryOptions},
    results::QueryResults,
    store::QueryStore,
    view::{BulkEntry, ViewOptions, ViewQuery, ViewResponse, ViewRow},
};

/// A query store backed by a view-indexed document database.
///
/// The adapter has two orthogonal configuration states: bound or unbound to
/// a database, and with or without a view descriptor. An unbound adapter
/// answers queries with an empty result; an adapter without a view
/// descriptor answers them with a full scan. Neither state changes behind
/// the caller's back: the database handle and view descriptor only move
/// through the explicit `bind_*` methods, and per-call view overrides never
/// touch the stored descriptor.
#[derive(Debug)]
pub struct DocumentStoreAdapter {
    database: Option<Arc<dyn DocumentDatabase>>,
    connector: Option<Arc<dyn DatabaseConnector>>,
    view: Option<ViewQuery>,
    id_property: String,
    engine: Arc<dyn QueryEngine>,
}

impl DocumentStoreAdapter {
    /// Creates a builder with no target, no view, the `"id"` identity field,
    /// and the in-memory query engine.
    pub fn builder() -> DocumentStoreAdapterBuilder {
        DocumentStoreAdapterBuilder::default()
    }

    /// The database handle this adapter is bound to, if any.
    pub fn database(&self) -> Option<&Arc<dyn DocumentDatabase>> {
        self.database.as_ref()
    }

    /// The stored view descriptor, if any.
    pub fn view_query(&self) -> Option<&ViewQuery> {
        self.view.as_ref()
    }

    /// The identity field name records are keyed by.
    pub fn id_property(&self) -> &str {
        &self.id_property
    }

    /// Binds the adapter to a database target.
    ///
    /// Handle targets are stored directly; name targets resolve through the
    /// configured connector.
    ///
    /// # Errors
    ///
    /// [`StoreError::Initialization`] for a name target when no connector
    /// was configured.
    pub async fn bind_target(&mut self, target: impl Into<Target>) -> StoreResult<()> {
        self.database = Some(resolve_target(target.into(), self.connector.as_deref()).await?);

        Ok(())
    }

    /// Associates the adapter with a named database view.
    ///
    /// Subsequent queries invoke the view instead of scanning the full
    /// database.
    pub fn bind_view_query(&mut self, view: ViewQuery) {
        self.view = Some(view);
    }

    /// Flattens a raw row response into the record sequence the query engine
    /// consumes: one record per row, in row order, taking the attached
    /// document when present and the emitted value otherwise.
    pub fn map_response(response: ViewResponse) -> Vec<Value> {
        response
            .rows
            .into_iter()
            .map(ViewRow::into_record)
            .collect()
    }

    /// Runs a declarative query, optionally adjusting the stored view
    /// descriptor's options for this call only.
    ///
    /// Overrides win over stored options on key collision and are forgotten
    /// once the call completes. On an adapter without a view descriptor the
    /// overrides are ignored, since a full scan has no options to adjust
    /// beyond attaching documents.
    pub async fn query_with(
        &self,
        filter: Option<Expr>,
        options: QueryOptions,
        overrides: Option<&ViewOptions>,
    ) -> StoreResult<QueryResults> {
        let Some(database) = &self.database else {
            return Ok(QueryResults::default());
        };

        let response = match &self.view {
            Some(view) => {
                debug!(database = database.name(), view = %view.view, "querying view");
                database
                    .query_view(&view.view, view.effective_options(overrides))
                    .await?
            }
            None => {
                debug!(database = database.name(), "scanning all documents");
                database
                    .fetch_all(ViewOptions::new().include_docs(true))
                    .await?
            }
        };

        let records = Self::map_response(response);
        debug!(records = records.len(), "applying query engine");

        self.engine.execute(filter.as_ref(), &options, records)
    }

    fn require_database(&self) -> StoreResult<&Arc<dyn DocumentDatabase>> {
        self.database
            .as_ref()
            .ok_or_else(|| StoreError::Initialization("no database bound".to_string()))
    }

    fn identity_string(&self, record: &Value) -> StoreResult<String> {
        match self.get_identity(record) {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(id) => Ok(id.to_string()),
            None => Err(StoreError::InvalidRecord(format!(
                "record has no {:?} field",
                self.id_property
            ))),
        }
    }
}

#[async_trait]
impl QueryStore for DocumentStoreAdapter {
    async fn query(
        &self,
        filter: Option<Expr>,
        options: QueryOptions,
    ) -> StoreResult<QueryResults> {
        self.query_with(filter, options, None).await
    }

    async fn get(&self, id: &str) -> StoreResult<Value> {
        self.require_database()?.get_by_id(id).await
    }

    fn get_identity<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        record
            .as_object()
            .and_then(|map| map.get(&self.id_property))
    }

    async fn set_data(&self, records: Vec<Value>) -> StoreResult<Vec<BulkEntry>> {
        self.require_database()?.bulk_insert(records).await
    }

    async fn put(&self, record: Value) -> StoreResult<String> {
        let id = self.identity_string(&record)?;

        self.require_database()?.put_document(&id, record).await
    }

    async fn add(&self, record: Value) -> StoreResult<String> {
        let id = self.identity_string(&record)?;

        self.require_database()?
            .insert_document(&id, record)
            .await
    }

    async fn remove(&self, id: &str) -> StoreResult<()> {
        self.require_database()?.delete_document(id).await
    }
}

/// Builder for [`DocumentStoreAdapter`].
///
/// `build` is async because name targets are resolved (and their databases
/// opened or created) at construction time.
#[derive(Debug, Default)]
pub struct DocumentStoreAdapterBuilder {
    target: Option<Target>,
    connector: Option<Arc<dyn DatabaseConnector>>,
    view: Option<ViewQuery>,
    id_property: Option<String>,
    engine: Option<Arc<dyn QueryEngine>>,
}

impl DocumentStoreAdapterBuilder {
    /// Sets the database target (name or open handle).
    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sets the connector used to resolve name targets.
    pub fn connector(mut self, connector: Arc<dyn DatabaseConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Sets the view descriptor queries are routed through.
    pub fn view_query(mut self, view: ViewQuery) -> Self {
        self.view = Some(view);
        self
    }

    /// Sets the identity field name. Defaults to `"id"`.
    pub fn id_property(mut self, id_property: impl Into<String>) -> Self {
        self.id_property = Some(id_property.into());
        self
    }

    /// Sets the query engine. Defaults to
    /// [`MemoryQueryEngine`](crate::engine::MemoryQueryEngine).
    pub fn query_engine(mut self, engine: Arc<dyn QueryEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Builds the adapter, resolving the target if one was given.
    ///
    /// # Errors
    ///
    /// [`StoreError::Initialization`] for a name target without a connector,
    /// or when opening the named database fails.
    pub async fn build(self) -> StoreResult<DocumentStoreAdapter> {
        let database = match self.target {
            Some(target) => Some(resolve_target(target, self.connector.as_deref()).await?),
            None => None,
        };

        Ok(DocumentStoreAdapter {
            database,
            connector: self.connector,
            view: self.view,
            id_property: self
                .id_property
                .unwrap_or_else(|| "id".to_string()),
            engine: self
                .engine
                .unwrap_or_else(|| Arc::new(MemoryQueryEngine)),
        })
    }
}

async fn resolve_target(
    target: Target,
    connector: Option<&dyn DatabaseConnector>,
) -> StoreResult<Arc<dyn DocumentDatabase>> {
    match target {
        Target::Handle(handle) => Ok(handle),
        Target::Name(name) => match connector {
            Some(connector) => connector.open(&name).await,
            None => Err(StoreError::Initialization(format!(
                "cannot open database {name:?} without a connector"
            ))),
        },
    }
}
