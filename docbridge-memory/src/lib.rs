//! In-memory document database backend for docbridge.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! [`DocumentDatabase`](docbridge_core::database::DocumentDatabase)
//! capability, with Couch-flavoured semantics: id-ordered full scans,
//! `_id`/`_rev` revision stamping with conflict detection, per-document
//! bulk-write outcomes, and named map views queried with key ranges and
//! row windows. Ideal for development and testing.
//!
//! # Quick start
//!
//! ```ignore
//! use docbridge_memory::MemoryConnector;
//! use serde_json::json;
//!
//! let connector = MemoryConnector::new();
//! let database = connector.database("people").await;
//!
//! database
//!     .bulk_insert(vec![json!({"_id": "1", "name": "ada"})])
//!     .await?;
//! database
//!     .define_view("by_name", |doc| vec![(doc["name"].clone(), json!(null))])
//!     .await;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbridge_memory;

pub mod database;

pub use database::{MemoryConnector, MemoryDatabase, ViewMapFn};
