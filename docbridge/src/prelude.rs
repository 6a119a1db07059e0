//! Convenient re-exports of commonly used types from docbridge.
//!
//! ```ignore
//! use docbridge::prelude::*;
//! ```

pub use docbridge_core::{
    adapter::{DocumentStoreAdapter, DocumentStoreAdapterBuilder},
    database::{DatabaseConnector, DocumentDatabase, Target},
    engine::{MemoryQueryEngine, QueryEngine},
    error::{StoreError, StoreResult},
    query::{Expr, FieldOp, Filter, QueryOptions, QueryVisitor, Sort, SortDirection},
    results::QueryResults,
    store::QueryStore,
    view::{BulkEntry, ViewOptions, ViewQuery, ViewResponse, ViewRow},
};
