//! Core of the docbridge project: a generic query-store interface over
//! view-indexed document databases.
//!
//! This crate provides:
//!
//! - **Store capability** ([`store`]) - The generic query-store contract a
//!   consumer codes against
//! - **The adapter** ([`adapter`]) - [`DocumentStoreAdapter`](adapter::DocumentStoreAdapter),
//!   binding the store contract to a document database
//! - **Database capability** ([`database`]) - Traits abstracting the backing
//!   document database and its connector
//! - **Query API** ([`query`]) - Declarative filter expressions and query
//!   options
//! - **Query engines** ([`engine`]) - Pluggable in-memory evaluation of
//!   declarative queries
//! - **View types** ([`view`]) - View descriptors, raw row responses, and
//!   bulk-write outcomes
//! - **Result handle** ([`results`]) - Windowed, countable query results
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docbridge_core::{
//!     adapter::DocumentStoreAdapter,
//!     query::{Filter, QueryOptions, SortDirection},
//!     store::QueryStore,
//!     view::{ViewOptions, ViewQuery},
//! };
//!
//! let adapter = DocumentStoreAdapter::builder()
//!     .connector(connector)
//!     .target("people")
//!     .view_query(ViewQuery::new("people/by_name").options(ViewOptions::new().include_docs(true)))
//!     .id_property("_id")
//!     .build()
//!     .await?;
//!
//! let adults = adapter
//!     .query(
//!         Some(Filter::gte("age", 18)),
//!         QueryOptions::new().sort("name", SortDirection::Asc).count(20),
//!     )
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbridge_core;

pub mod adapter;
pub mod database;
pub mod engine;
pub mod error;
pub mod query;
pub mod results;
pub mod store;
pub mod view;
