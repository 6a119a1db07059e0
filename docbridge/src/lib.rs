//! Main docbridge crate: a generic query-store interface over view-indexed
//! document databases.
//!
//! This crate is the primary entry point for users of docbridge. It
//! re-exports the core types and provides access to the bundled in-memory
//! backend.
//!
//! # Quick start
//!
//! ```ignore
//! use docbridge::{memory::MemoryConnector, prelude::*};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> StoreResult<()> {
//!     let connector = Arc::new(MemoryConnector::new());
//!
//!     // Seed a database and index it by name.
//!     let database = connector.database("people").await;
//!     database
//!         .bulk_insert(vec![
//!             json!({"_id": "1", "name": "ada", "age": 36}),
//!             json!({"_id": "2", "name": "grace", "age": 45}),
//!         ])
//!         .await?;
//!     database
//!         .define_view("by_name", |doc| vec![(doc["name"].clone(), doc.clone())])
//!         .await;
//!
//!     // Bind an adapter to the database and its view.
//!     let adapter = DocumentStoreAdapter::builder()
//!         .connector(connector)
//!         .target("people")
//!         .view_query(ViewQuery::new("by_name"))
//!         .id_property("_id")
//!         .build()
//!         .await?;
//!
//!     // Query declaratively; the engine filters, sorts, and windows.
//!     let results = adapter
//!         .query(
//!             Some(Filter::gte("age", 40)),
//!             QueryOptions::new().sort("name", SortDirection::Asc),
//!         )
//!         .await?;
//!
//!     println!("matched {} of {}", results.len(), results.total());
//!     Ok(())
//! }
//! ```

pub mod prelude;

pub use docbridge_core::{adapter, database, engine, error, query, results, store, view};

/// In-memory database backend implementations.
pub mod memory {
    pub use docbridge_memory::{MemoryConnector, MemoryDatabase, ViewMapFn};
}
