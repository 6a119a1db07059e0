//! In-memory document database with named map views.
//!
//! [`MemoryDatabase`] implements the
//! [`DocumentDatabase`](docbridge_core::database::DocumentDatabase)
//! capability entirely in memory: documents live in an id-ordered map behind
//! an async read-write lock, carry `_id`/`_rev` fields with conflict checks
//! on write, and can be indexed by registered map functions that emit
//! key/value rows. [`MemoryConnector`] opens databases by name with
//! open-or-create semantics, sharing state between handles to the same name.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use mea::rwlock::RwLock;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use docbridge_core::{
    database::{DatabaseConnector, DocumentDatabase},
    engine::Comparable,
    error::{StoreError, StoreResult},
    view::{BulkEntry, ViewOptions, ViewResponse, ViewRow},
};

/// A view map function: emits zero or more (key, value) rows per document.
pub type ViewMapFn = dyn Fn(&Value) -> Vec<(Value, Value)> + Send + Sync;

type DocumentMap = BTreeMap<String, Value>;
type ViewRegistry = HashMap<String, Arc<ViewMapFn>>;

/// Thread-safe in-memory document database.
///
/// Cloning shares the underlying state, so a clone handed to an adapter
/// observes writes made through any other clone. Queries scan all documents;
/// views are evaluated on invocation rather than maintained incrementally.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    name: String,
    documents: Arc<RwLock<DocumentMap>>,
    views: Arc<RwLock<ViewRegistry>>,
}

impl MemoryDatabase {
    /// Creates an empty database with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Arc::new(RwLock::new(DocumentMap::new())),
            views: Arc::new(RwLock::new(ViewRegistry::new())),
        }
    }

    /// Registers (or replaces) a named map view.
    ///
    /// The map function is applied to every document when the view is
    /// queried; each returned (key, value) pair becomes one row.
    pub async fn define_view<F>(&self, name: impl Into<String>, map: F)
    where
        F: Fn(&Value) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        self.views
            .write()
            .await
            .insert(name.into(), Arc::new(map));
    }

    /// Number of documents currently stored.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the database holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn store_record(
        documents: &mut DocumentMap,
        id: &str,
        mut record: Value,
    ) -> StoreResult<String> {
        let Some(map) = record.as_object_mut() else {
            return Err(StoreError::InvalidRecord("record is not an object".to_string()));
        };

        let current_rev = documents
            .get(id)
            .and_then(|doc| doc.get("_rev"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let given_rev = map.get("_rev").and_then(Value::as_str);

        if given_rev.map(str::to_string) != current_rev {
            return Err(StoreError::Conflict(format!("document update conflict: {id}")));
        }

        let rev = next_rev(current_rev.as_deref());
        map.insert("_id".to_string(), json!(id));
        map.insert("_rev".to_string(), json!(rev.clone()));
        documents.insert(id.to_string(), record);

        Ok(rev)
    }
}

impl fmt::Debug for MemoryDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDatabase")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentDatabase for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_all(&self, options: ViewOptions) -> StoreResult<ViewResponse> {
        let documents = self.documents.read().await;
        let include_docs = options.include_docs.unwrap_or(false);

        let rows = documents
            .iter()
            .map(|(id, doc)| ViewRow {
                id: Some(id.clone()),
                key: json!(id),
                value: json!({ "rev": doc.get("_rev").cloned().unwrap_or(Value::Null) }),
                doc: include_docs.then(|| doc.clone()),
            })
            .collect::<Vec<_>>();

        let total = rows.len() as u64;
        let (rows, offset) = window_rows(rows, &options);
        debug!(database = %self.name, rows = rows.len(), "fetched all documents");

        Ok(ViewResponse { total_rows: Some(total), offset: Some(offset), rows })
    }

    async fn query_view(&self, view: &str, options: ViewOptions) -> StoreResult<ViewResponse> {
        if options.reduce.unwrap_or(false) || options.group.unwrap_or(false) {
            return Err(StoreError::Backend(format!(
                "view {view:?} has no reduce function"
            )));
        }

        let map = self
            .views
            .read()
            .await
            .get(view)
            .cloned()
            .ok_or_else(|| StoreError::ViewNotFound(view.to_string()))?;

        let documents = self.documents.read().await;
        let include_docs = options.include_docs.unwrap_or(false);

        let mut rows = Vec::new();
        for (id, doc) in documents.iter() {
            for (key, value) in map(doc) {
                rows.push(ViewRow {
                    id: Some(id.clone()),
                    key,
                    value,
                    doc: include_docs.then(|| doc.clone()),
                });
            }
        }

        // Rows sort by emitted key; emission order breaks ties.
        rows.sort_by(|a, b| cmp_keys(&a.key, &b.key));

        let total = rows.len() as u64;
        let (rows, offset) = window_rows(rows, &options);
        debug!(database = %self.name, view, rows = rows.len(), "queried view");

        Ok(ViewResponse { total_rows: Some(total), offset: Some(offset), rows })
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Value> {
        self.documents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn bulk_insert(&self, records: Vec<Value>) -> StoreResult<Vec<BulkEntry>> {
        let mut documents = self.documents.write().await;
        let mut entries = Vec::with_capacity(records.len());

        for record in records {
            if !record.is_object() {
                return Err(StoreError::InvalidRecord("record is not an object".to_string()));
            }

            let id = match record.get("_id").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => Uuid::new_v4().simple().to_string(),
            };

            entries.push(match Self::store_record(&mut documents, &id, record) {
                Ok(rev) => BulkEntry::Saved { id, rev },
                Err(StoreError::Conflict(_)) => BulkEntry::Failed {
                    id,
                    error: "conflict".to_string(),
                    reason: "Document update conflict.".to_string(),
                },
                Err(err) => return Err(err),
            });
        }

        debug!(database = %self.name, records = entries.len(), "bulk insert");

        Ok(entries)
    }

    async fn put_document(&self, id: &str, record: Value) -> StoreResult<String> {
        let mut documents = self.documents.write().await;

        Self::store_record(&mut documents, id, record)
    }

    async fn insert_document(&self, id: &str, record: Value) -> StoreResult<String> {
        let mut documents = self.documents.write().await;

        if documents.contains_key(id) {
            return Err(StoreError::Conflict(format!("document already exists: {id}")));
        }

        Self::store_record(&mut documents, id, record)
    }

    async fn delete_document(&self, id: &str) -> StoreResult<()> {
        if self.documents.write().await.remove(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

/// Opens [`MemoryDatabase`]s by name.
///
/// Databases are created on first open; subsequent opens of the same name
/// yield handles over the same documents.
#[derive(Debug, Default, Clone)]
pub struct MemoryConnector {
    databases: Arc<RwLock<HashMap<String, MemoryDatabase>>>,
}

impl MemoryConnector {
    /// Creates a connector with no databases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or creates) a database, returning the concrete handle.
    ///
    /// Useful for seeding documents and registering views in tests before
    /// handing the name to an adapter.
    pub async fn database(&self, name: &str) -> MemoryDatabase {
        self.databases
            .write()
            .await
            .entry(name.to_string())
            .or_insert_with(|| MemoryDatabase::new(name))
            .clone()
    }
}

#[async_trait]
impl DatabaseConnector for MemoryConnector {
    async fn open(&self, name: &str) -> StoreResult<Arc<dyn DocumentDatabase>> {
        Ok(Arc::new(self.database(name).await))
    }
}

fn cmp_keys(a: &Value, b: &Value) -> Ordering {
    Comparable::from(a)
        .partial_cmp(&Comparable::from(b))
        .unwrap_or(Ordering::Equal)
}

fn next_rev(current: Option<&str>) -> String {
    let generation = current
        .and_then(|rev| rev.split('-').next())
        .and_then(|generation| generation.parse::<u64>().ok())
        .unwrap_or(0);

    format!("{}-{}", generation + 1, Uuid::new_v4().simple())
}

/// Applies key filters, the key range, and the skip/limit window to rows
/// already sorted in ascending key order. Returns the surviving rows and the
/// number of rows dropped from the front of the traversal.
fn window_rows(mut rows: Vec<ViewRow>, options: &ViewOptions) -> (Vec<ViewRow>, u64) {
    let descending = options.descending.unwrap_or(false);
    if descending {
        rows.reverse();
    }

    if let Some(key) = &options.key {
        rows.retain(|row| cmp_keys(&row.key, key) == Ordering::Equal);
    }
    if let Some(keys) = &options.keys {
        rows.retain(|row| keys.iter().any(|key| cmp_keys(&row.key, key) == Ordering::Equal));
    }

    let mut offset = 0u64;

    if let Some(start) = &options.start_key {
        // In traversal order: ascending starts at key >= startkey,
        // descending at key <= startkey.
        let from = rows
            .iter()
            .position(|row| match cmp_keys(&row.key, start) {
                Ordering::Equal => true,
                Ordering::Greater => !descending,
                Ordering::Less => descending,
            })
            .unwrap_or(rows.len());
        offset += from as u64;
        rows.drain(..from);
    }

    if let Some(end) = &options.end_key {
        let inclusive = options.inclusive_end.unwrap_or(true);
        let to = rows
            .iter()
            .position(|row| match cmp_keys(&row.key, end) {
                Ordering::Equal => !inclusive,
                Ordering::Greater => !descending,
                Ordering::Less => descending,
            })
            .unwrap_or(rows.len());
        rows.truncate(to);
    }

    let skip = (options.skip.unwrap_or(0) as usize).min(rows.len());
    offset += skip as u64;
    rows.drain(..skip);

    if let Some(limit) = options.limit {
        rows.truncate(limit as usize);
    }

    (rows, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> MemoryDatabase {
        let database = MemoryDatabase::new("people");
        database
            .bulk_insert(vec![
                json!({"_id": "1", "name": "ada", "age": 36}),
                json!({"_id": "2", "name": "grace", "age": 45}),
                json!({"_id": "3", "name": "alan", "age": 41}),
            ])
            .await
            .unwrap();

        database
    }

    #[tokio::test]
    async fn bulk_insert_stamps_first_generation_revisions() {
        let database = seeded().await;

        let doc = database.get_by_id("1").await.unwrap();
        let rev = doc["_rev"].as_str().unwrap();

        assert!(rev.starts_with("1-"));
        assert_eq!(doc["_id"], json!("1"));
    }

    #[tokio::test]
    async fn bulk_insert_generates_ids_when_missing() {
        let database = MemoryDatabase::new("db");

        let entries = database
            .bulk_insert(vec![json!({"name": "x"})])
            .await
            .unwrap();

        let BulkEntry::Saved { id, .. } = &entries[0] else {
            panic!("expected a saved entry");
        };
        assert!(!id.is_empty());
        assert!(database.get_by_id(id).await.is_ok());
    }

    #[tokio::test]
    async fn stale_revision_fails_its_entry_but_not_the_batch() {
        let database = seeded().await;

        let entries = database
            .bulk_insert(vec![
                json!({"_id": "1", "_rev": "0-stale", "name": "ada lovelace"}),
                json!({"_id": "4", "name": "edsger"}),
            ])
            .await
            .unwrap();

        assert!(matches!(&entries[0], BulkEntry::Failed { id, error, .. }
            if id == "1" && error == "conflict"));
        assert!(entries[1].is_saved());
        assert_eq!(database.get_by_id("1").await.unwrap()["name"], json!("ada"));
        assert!(database.get_by_id("4").await.is_ok());
    }

    #[tokio::test]
    async fn put_with_matching_revision_advances_the_generation() {
        let database = seeded().await;
        let mut doc = database.get_by_id("1").await.unwrap();
        doc["age"] = json!(37);

        let rev = database.put_document("1", doc).await.unwrap();

        assert!(rev.starts_with("2-"));
        assert_eq!(database.get_by_id("1").await.unwrap()["age"], json!(37));
    }

    #[tokio::test]
    async fn put_without_revision_on_existing_document_conflicts() {
        let database = seeded().await;

        let err = database
            .put_document("1", json!({"name": "imposter"}))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn insert_refuses_existing_ids() {
        let database = seeded().await;

        let err = database
            .insert_document("1", json!({"name": "imposter"}))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_removes_and_missing_ids_are_not_found() {
        let database = seeded().await;

        database.delete_document("1").await.unwrap();

        assert!(matches!(
            database.get_by_id("1").await.unwrap_err(),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            database.delete_document("1").await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn fetch_all_orders_rows_by_id_and_attaches_docs_on_request() {
        let database = seeded().await;

        let bare = database.fetch_all(ViewOptions::new()).await.unwrap();
        assert_eq!(bare.total_rows, Some(3));
        assert!(bare.rows.iter().all(|row| row.doc.is_none()));

        let with_docs = database
            .fetch_all(ViewOptions::new().include_docs(true))
            .await
            .unwrap();
        let ids: Vec<_> = with_docs
            .rows
            .iter()
            .map(|row| row.id.clone().unwrap())
            .collect();

        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(with_docs.rows[0].doc.as_ref().unwrap()["name"], json!("ada"));
        // The row value is the revision stub, not the document.
        assert!(with_docs.rows[0].value["rev"].is_string());
    }

    #[tokio::test]
    async fn fetch_all_honors_key_range_and_window() {
        let database = seeded().await;

        let response = database
            .fetch_all(ViewOptions::new().start_key("2").skip(1))
            .await
            .unwrap();

        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0].id, Some("3".to_string()));
        assert_eq!(response.offset, Some(2));
    }

    #[tokio::test]
    async fn views_sort_rows_by_emitted_key() {
        let database = seeded().await;
        database
            .define_view("by_name", |doc| {
                vec![(doc["name"].clone(), json!({"age": doc["age"]}))]
            })
            .await;

        let response = database
            .query_view("by_name", ViewOptions::new())
            .await
            .unwrap();
        let keys: Vec<_> = response.rows.iter().map(|row| row.key.clone()).collect();

        assert_eq!(keys, vec![json!("ada"), json!("alan"), json!("grace")]);
        assert_eq!(response.rows[0].value, json!({"age": 36}));
    }

    #[tokio::test]
    async fn views_honor_descending_and_limit() {
        let database = seeded().await;
        database
            .define_view("by_name", |doc| vec![(doc["name"].clone(), Value::Null)])
            .await;

        let response = database
            .query_view("by_name", ViewOptions::new().descending(true).limit(2))
            .await
            .unwrap();
        let keys: Vec<_> = response.rows.iter().map(|row| row.key.clone()).collect();

        assert_eq!(keys, vec![json!("grace"), json!("alan")]);
        assert_eq!(response.total_rows, Some(3));
    }

    #[tokio::test]
    async fn views_honor_exact_key_and_exclusive_end() {
        let database = seeded().await;
        database
            .define_view("by_age", |doc| vec![(doc["age"].clone(), Value::Null)])
            .await;

        let exact = database
            .query_view("by_age", ViewOptions::new().key(41))
            .await
            .unwrap();
        assert_eq!(exact.rows.len(), 1);
        assert_eq!(exact.rows[0].id, Some("3".to_string()));

        let range = database
            .query_view(
                "by_age",
                ViewOptions::new()
                    .start_key(36)
                    .end_key(45)
                    .inclusive_end(false),
            )
            .await
            .unwrap();
        let keys: Vec<_> = range.rows.iter().map(|row| row.key.clone()).collect();

        assert_eq!(keys, vec![json!(36), json!(41)]);
    }

    #[tokio::test]
    async fn views_can_attach_documents() {
        let database = seeded().await;
        database
            .define_view("by_name", |doc| vec![(doc["name"].clone(), Value::Null)])
            .await;

        let response = database
            .query_view("by_name", ViewOptions::new().include_docs(true))
            .await
            .unwrap();

        assert_eq!(response.rows[0].doc.as_ref().unwrap()["name"], json!("ada"));
    }

    #[tokio::test]
    async fn unknown_views_and_reduce_requests_are_rejected() {
        let database = seeded().await;
        database
            .define_view("by_name", |doc| vec![(doc["name"].clone(), Value::Null)])
            .await;

        assert!(matches!(
            database
                .query_view("missing", ViewOptions::new())
                .await
                .unwrap_err(),
            StoreError::ViewNotFound(_)
        ));
        assert!(matches!(
            database
                .query_view("by_name", ViewOptions::new().reduce(true))
                .await
                .unwrap_err(),
            StoreError::Backend(_)
        ));
    }

    #[tokio::test]
    async fn connector_shares_state_between_opens_of_the_same_name() {
        let connector = MemoryConnector::new();

        let first = connector.database("people").await;
        first
            .bulk_insert(vec![json!({"_id": "1", "name": "ada"})])
            .await
            .unwrap();

        let second = connector.open("people").await.unwrap();

        assert_eq!(second.get_by_id("1").await.unwrap()["name"], json!("ada"));
        assert!(connector.database("other").await.is_empty().await);
    }
}
