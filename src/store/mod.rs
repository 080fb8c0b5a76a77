//! Document Store Module
//!
//! In-memory data for every document the node holds.
//!
//! ## Responsibilities
//! - Named documents of integer-keyed JSON records
//! - Implicit schema inferred from each document's first record
//! - Contiguous re-keying after deletes
//! - Field-equality queries with loose comparison
//!
//! ## Data Structure Choice
//! Documents are insertion-ordered vectors: lookups scan linearly, which
//! keeps "first record" and re-keying semantics trivial. There is no
//! secondary index and nothing is persisted.

mod database;
mod document;
mod query;
pub mod value;

pub use database::{Database, UpdateOutcome};
pub use document::{keyed_to_json, Document};
pub use query::Query;

/// One entry of a document: field name → JSON value
pub type Record = serde_json::Map<String, serde_json::Value>;
