//! Tests for the document store
//!
//! These tests verify:
//! - Document lifecycle (create/drop/empty)
//! - Implicit schema enforcement
//! - Re-keying after deletes
//! - Field-equality queries and loose comparison


use memdocdb::store::Record;
use serde_json::Value;

// =============================================================================
// Helper Functions
// =============================================================================

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected object, got {}", other),
    }
}
