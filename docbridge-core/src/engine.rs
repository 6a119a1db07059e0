//! In-memory query engines.
//!
//! A [`QueryEngine`] applies a declarative filter/sort/paginate query to a
//! flat sequence of records and produces a [`QueryResults`] window. The
//! engine a store uses is pluggable; [`MemoryQueryEngine`] is the default
//! and evaluates everything in memory.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;

use serde_json::Value;

use crate::{
    error::{StoreError, StoreResult},
    query::{Expr, FieldOp, QueryOptions, QueryVisitor, Sort, SortDirection},
    results::QueryResults,
};

/// Applies a query to an in-memory sequence of records.
///
/// Implementations must not mutate shared state; the adapter may call
/// `execute` from concurrent tasks.
pub trait QueryEngine: Send + Sync + Debug {
    /// Filters `records` with `filter` (when present), sorts them per
    /// `options.sort`, records the matched count, and applies the
    /// `start`/`count` window.
    fn execute(
        &self,
        filter: Option<&Expr>,
        options: &QueryOptions,
        records: Vec<Value>,
    ) -> StoreResult<QueryResults>;
}

/// The default in-memory query engine.
///
/// Filter first, then a stable multi-key sort (keys in the order given,
/// missing fields compare as null), then the result window. The reported
/// total is the matched count before windowing.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryQueryEngine;

impl QueryEngine for MemoryQueryEngine {
    fn execute(
        &self,
        filter: Option<&Expr>,
        options: &QueryOptions,
        records: Vec<Value>,
    ) -> StoreResult<QueryResults> {
        let mut matched = match filter {
            Some(expr) => RecordEvaluator::filter_records(records, expr)?,
            None => records,
        };

        if !options.sort.is_empty() {
            matched.sort_by(|a, b| compare_by_keys(a, b, &options.sort));
        }

        let total = matched.len();
        let items = matched
            .into_iter()
            .skip(options.start.unwrap_or(0))
            .take(options.count.unwrap_or(usize::MAX))
            .collect();

        Ok(QueryResults::new(items, total))
    }
}

fn compare_by_keys(a: &Value, b: &Value, keys: &[Sort]) -> Ordering {
    for sort in keys {
        let left = a
            .get(&sort.field)
            .map(Comparable::from)
            .unwrap_or(Comparable::Null);
        let right = b
            .get(&sort.field)
            .map(Comparable::from)
            .unwrap_or(Comparable::Null);

        let ordering = match sort.direction {
            SortDirection::Asc => left.partial_cmp(&right),
            SortDirection::Desc => right.partial_cmp(&left),
        };

        match ordering {
            Some(Ordering::Equal) | None => continue,
            Some(ordering) => return ordering,
        }
    }

    Ordering::Equal
}

/// Type-erased, comparable representation of JSON values.
///
/// Wraps JSON values for the comparisons query evaluation needs. Numbers are
/// normalized to f64; values of different kinds are unordered.
#[derive(Debug)]
pub enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => Comparable::Number(value.as_f64().unwrap_or(f64::NAN)),
            Value::String(value) => Comparable::String(value),
            Value::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Value::Object(map) => Comparable::Map(
                map
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Evaluates a filter expression against one record.
pub struct RecordEvaluator<'a> {
    record: &'a Value,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(record: &'a Value) -> Self {
        Self { record }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> StoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Keeps the records matching `expr`, preserving input order. Records
    /// the expression cannot be evaluated against are dropped.
    pub fn filter_records(records: Vec<Value>, expr: &Expr) -> StoreResult<Vec<Value>> {
        Ok(records
            .into_iter()
            .filter(|record| {
                RecordEvaluator::new(record)
                    .evaluate(expr)
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>())
    }

    fn field(&self, field: &str) -> Option<&'a Value> {
        self.record.as_object().and_then(|map| map.get(field))
    }
}

impl<'a> QueryVisitor for RecordEvaluator<'a> {
    type Output = bool;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(self.field(field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Value) -> Result<Self::Output, Self::Error> {
        match self.field(field) {
            Some(field_value) => match op {
                FieldOp::Eq => Ok(Comparable::from(field_value) == Comparable::from(value)),
                FieldOp::Ne => Ok(Comparable::from(field_value) != Comparable::from(value)),
                FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                    match Comparable::from(field_value).partial_cmp(&Comparable::from(value)) {
                        Some(ordering) => Ok(match op {
                            FieldOp::Gt => ordering == Ordering::Greater,
                            FieldOp::Gte => ordering != Ordering::Less,
                            FieldOp::Lt => ordering == Ordering::Less,
                            FieldOp::Lte => ordering != Ordering::Greater,
                            _ => unreachable!(),
                        }),
                        None => Ok(false),
                    }
                }
                FieldOp::Contains => match Comparable::from(field_value) {
                    Comparable::Array(array) => Ok(
                        array
                            .iter()
                            .any(|item| item == &Comparable::from(value)),
                    ),
                    Comparable::String(left) => match Comparable::from(value) {
                        Comparable::String(right) => Ok(left.contains(right)),
                        _ => Ok(false),
                    },
                    _ => Ok(false),
                },
                FieldOp::NotContains => match Comparable::from(field_value) {
                    Comparable::Array(array) => Ok(
                        !array
                            .iter()
                            .any(|item| item == &Comparable::from(value)),
                    ),
                    Comparable::String(left) => match Comparable::from(value) {
                        Comparable::String(right) => Ok(!left.contains(right)),
                        _ => Ok(true),
                    },
                    _ => Ok(true),
                },
                FieldOp::StartsWith => match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::String(left), Comparable::String(right)) => Ok(left.starts_with(right)),
                    _ => Ok(false),
                },
                FieldOp::EndsWith => match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::String(left), Comparable::String(right)) => Ok(left.ends_with(right)),
                    _ => Ok(false),
                },
                FieldOp::AnyOf => match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::Array(array), Comparable::Array(values)) => {
                        Ok(values.iter().any(|val| array.contains(val)))
                    }
                    (Comparable::Array(array), single_value) => Ok(array.contains(&single_value)),
                    (single_value, Comparable::Array(values)) => Ok(values.contains(&single_value)),
                    _ => Ok(false),
                },
                FieldOp::NoneOf => match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::Array(array), Comparable::Array(values)) => {
                        Ok(!values.iter().any(|val| array.contains(val)))
                    }
                    (Comparable::Array(array), single_value) => Ok(!array.contains(&single_value)),
                    (single_value, Comparable::Array(values)) => Ok(!values.contains(&single_value)),
                    _ => Ok(true),
                },
            },
            None => Ok(false),
        }
    }
}
