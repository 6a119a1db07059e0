//! View descriptors, view responses, and bulk-write outcomes.
//!
//! A store can be associated with a named server-side view; queries are then
//! routed through that view instead of a full scan. [`ViewQuery`] names the
//! view and carries its invocation parameters, [`ViewResponse`] is the raw
//! row shape every database operation returns, and [`BulkEntry`] is the
//! per-document outcome of a bulk write.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters passed to the database when invoking a view or a full scan.
///
/// Field names serialize to the backing protocol's wire names. All fields
/// are optional; `None` means "backend default". Backends that index by key
/// interpret `key`/`keys`/`start_key`/`end_key` against the emitted view
/// keys (or document ids for full scans).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ViewOptions {
    /// Return only rows with exactly this key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    /// Return only rows whose key is one of these.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<Value>>,
    /// First key of the row range.
    #[serde(rename = "startkey", skip_serializing_if = "Option::is_none")]
    pub start_key: Option<Value>,
    /// Last key of the row range.
    #[serde(rename = "endkey", skip_serializing_if = "Option::is_none")]
    pub end_key: Option<Value>,
    /// Whether the row at `end_key` is part of the range. Defaults to true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusive_end: Option<bool>,
    /// Reverse the row order (and swap the meaning of the range bounds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descending: Option<bool>,
    /// Maximum number of rows to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Number of rows to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    /// Attach the full document to each row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_docs: Option<bool>,
    /// Run the view's reduce function instead of returning map rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce: Option<bool>,
    /// Group reduced rows by key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<bool>,
}

impl ViewOptions {
    /// Creates options with every field unset.
    pub fn new() -> Self {
        ViewOptions::default()
    }

    /// Sets `key`.
    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets `keys`.
    pub fn keys(mut self, keys: Vec<Value>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Sets `startkey`.
    pub fn start_key(mut self, key: impl Into<Value>) -> Self {
        self.start_key = Some(key.into());
        self
    }

    /// Sets `endkey`.
    pub fn end_key(mut self, key: impl Into<Value>) -> Self {
        self.end_key = Some(key.into());
        self
    }

    /// Sets `inclusive_end`.
    pub fn inclusive_end(mut self, inclusive: bool) -> Self {
        self.inclusive_end = Some(inclusive);
        self
    }

    /// Sets `descending`.
    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = Some(descending);
        self
    }

    /// Sets `limit`.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets `skip`.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets `include_docs`.
    pub fn include_docs(mut self, include: bool) -> Self {
        self.include_docs = Some(include);
        self
    }

    /// Sets `reduce`.
    pub fn reduce(mut self, reduce: bool) -> Self {
        self.reduce = Some(reduce);
        self
    }

    /// Sets `group`.
    pub fn group(mut self, group: bool) -> Self {
        self.group = Some(group);
        self
    }

    /// Returns a new set of options with `overrides` applied on top of
    /// `self`, override fields winning on collision.
    ///
    /// Neither operand is modified. Per-call overrides must never leak into
    /// a stored descriptor.
    pub fn merged(&self, overrides: &ViewOptions) -> ViewOptions {
        ViewOptions {
            key: overrides.key.clone().or_else(|| self.key.clone()),
            keys: overrides.keys.clone().or_else(|| self.keys.clone()),
            start_key: overrides
                .start_key
                .clone()
                .or_else(|| self.start_key.clone()),
            end_key: overrides.end_key.clone().or_else(|| self.end_key.clone()),
            inclusive_end: overrides.inclusive_end.or(self.inclusive_end),
            descending: overrides.descending.or(self.descending),
            limit: overrides.limit.or(self.limit),
            skip: overrides.skip.or(self.skip),
            include_docs: overrides.include_docs.or(self.include_docs),
            reduce: overrides.reduce.or(self.reduce),
            group: overrides.group.or(self.group),
        }
    }
}

/// Associates a store with a named server-side view.
///
/// When a store carries a `ViewQuery`, its queries invoke `view` with
/// `options` instead of scanning the full database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery {
    /// Name of the view, in the backend's addressing scheme.
    pub view: String,
    /// Parameters passed when the view is invoked.
    pub options: ViewOptions,
}

impl ViewQuery {
    /// Creates a descriptor for `view` with default options.
    pub fn new(view: impl Into<String>) -> Self {
        Self { view: view.into(), options: ViewOptions::default() }
    }

    /// Replaces the invocation options.
    pub fn options(mut self, options: ViewOptions) -> Self {
        self.options = options;
        self
    }

    /// Computes the effective options for one invocation, merging per-call
    /// `overrides` over the stored options without modifying them.
    pub fn effective_options(&self, overrides: Option<&ViewOptions>) -> ViewOptions {
        match overrides {
            Some(overrides) => self.options.merged(overrides),
            None => self.options.clone(),
        }
    }
}

/// One row of a view response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ViewRow {
    /// Id of the document the row was emitted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The emitted key (the document id for full scans).
    #[serde(default)]
    pub key: Value,
    /// The emitted value (a revision stub for full scans).
    #[serde(default)]
    pub value: Value,
    /// The full document, present when `include_docs` was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
}

impl ViewRow {
    /// Collapses the row to a single record: the attached document when
    /// present, the emitted value otherwise.
    pub fn into_record(self) -> Value {
        match self.doc {
            Some(doc) => doc,
            None => self.value,
        }
    }
}

/// The raw response of a view invocation or full scan: an ordered sequence
/// of rows plus window metadata.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ViewResponse {
    /// Total number of rows in the view, ignoring `skip`/`limit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    /// Number of rows skipped before the first returned row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// The rows, in view order.
    pub rows: Vec<ViewRow>,
}

/// Per-document outcome of a bulk write.
///
/// A bulk write never fails wholesale over individual documents: each record
/// either saves with a new revision or fails with a backend error code
/// (typically a revision conflict), and the outcomes come back in input
/// order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum BulkEntry {
    /// The document was written; `rev` is its new revision.
    Saved {
        id: String,
        rev: String,
    },
    /// The document was not written.
    Failed {
        id: String,
        error: String,
        reason: String,
    },
}

impl BulkEntry {
    /// Whether this entry represents a successful write.
    pub fn is_saved(&self) -> bool {
        matches!(self, BulkEntry::Saved { .. })
    }

    /// The document id this entry refers to.
    pub fn id(&self) -> &str {
        match self {
            BulkEntry::Saved { id, .. } => id,
            BulkEntry::Failed { id, .. } => id,
        }
    }
}
