//! Query engine
//!
//! Field-equality matching with loose comparison, AND across fields.

use serde_json::{Map, Value};

use super::value::loose_eq;
use super::Record;
use crate::error::{MemDbError, Result};

/// A field → expected value filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    fields: Map<String, Value>,
}

impl Query {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a query from the `query` request parameter
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self::new(fields.clone())),
            _ => Err(MemDbError::InvalidDataShape(
                "Query must be provided as an object.".to_string(),
            )),
        }
    }

    /// True when every query field is present in `record` with a loosely
    /// equal value. A null field counts as absent. Stops at the first
    /// mismatch.
    pub fn matches(&self, record: &Record) -> bool {
        self.fields.iter().all(|(field, expected)| {
            record
                .get(field)
                .is_some_and(|actual| !actual.is_null() && loose_eq(actual, expected))
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
