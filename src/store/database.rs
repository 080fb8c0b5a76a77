//! Database implementation
//!
//! Owns every document and implements the store operations. Pure data
//! structure logic: no I/O and no locking, the event loop is the only
//! owner.

use serde_json::{Map, Value};

use super::document::{as_record, entries_in};
use super::value::loose_eq;
use super::{Document, Query, Record};
use crate::error::{MemDbError, Result};

/// All documents held by this node, in creation order
#[derive(Debug, Clone, Default)]
pub struct Database {
    documents: Vec<(String, Document)>,
}

/// Result of an `update`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// Schema of the document before the update
    pub document_keys: Vec<String>,

    /// Fields that actually changed, keyed by the patched id
    pub changed: Option<(i64, Record)>,

    /// True when the whole document was replaced
    pub replaced: bool,
}

impl Database {
    /// Create a new empty Database
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Borrow a document by name
    pub fn document(&self, name: &str) -> Result<&Document> {
        self.position(name)
            .map(|i| &self.documents[i].1)
            .ok_or(MemDbError::NotFound)
    }

    fn document_mut(&mut self, name: &str) -> Result<&mut Document> {
        let i = self.position(name).ok_or(MemDbError::NotFound)?;
        Ok(&mut self.documents[i].1)
    }

    // =========================================================================
    // Document lifecycle
    // =========================================================================

    pub fn create_document(&mut self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(MemDbError::AlreadyExists);
        }
        self.documents.push((name.to_string(), Document::new()));
        Ok(())
    }

    pub fn drop_document(&mut self, name: &str) -> Result<()> {
        let i = self.position(name).ok_or(MemDbError::NotFound)?;
        self.documents.remove(i);
        Ok(())
    }

    /// Remove every record; the implicit schema is forgotten with them
    pub fn empty_document(&mut self, name: &str) -> Result<()> {
        self.document_mut(name)?.clear();
        Ok(())
    }

    /// Add a document received from a peer unless one with that name exists
    ///
    /// Returns whether the document was taken.
    pub fn merge_document(&mut self, name: &str, document: Document) -> bool {
        if self.contains(name) {
            return false;
        }
        self.documents.push((name.to_string(), document));
        true
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Names of every document
    pub fn list(&self) -> Vec<&str> {
        self.documents.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn documents(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.documents.iter().map(|(name, doc)| (name.as_str(), doc))
    }

    /// Every document in wire form, keyed by name
    pub fn snapshot(&self) -> Value {
        let mut map = Map::with_capacity(self.documents.len());
        for (name, document) in &self.documents {
            map.insert(name.clone(), document.to_json());
        }
        Value::Object(map)
    }

    /// Read records
    ///
    /// - `id` given: the record at that key, or nothing
    /// - else `query` given: every matching record
    /// - else: the whole document
    pub fn get(
        &self,
        name: &str,
        id: Option<i64>,
        query: Option<&Query>,
    ) -> Result<Vec<(i64, &Record)>> {
        let document = self.document(name)?;

        if let Some(id) = id {
            return Ok(document.get(id).map(|r| (id, r)).into_iter().collect());
        }

        Ok(match query {
            Some(query) => document.iter().filter(|(_, r)| query.matches(r)).collect(),
            None => document.iter().collect(),
        })
    }

    /// Field names and key of the first record
    ///
    /// Uses whichever record iterates first, which is not necessarily key 0.
    /// `None` for an empty document.
    pub fn get_keys(&self, name: &str) -> Result<Option<(i64, Vec<String>)>> {
        let document = self.document(name)?;
        Ok(document.first().map(|(key, _)| (key, document.schema())))
    }

    /// Number of records, or of records matching `query`
    pub fn count(&self, name: &str, query: Option<&Query>) -> Result<usize> {
        let document = self.document(name)?;
        Ok(match query {
            Some(query) => document.iter().filter(|(_, r)| query.matches(r)).count(),
            None => document.len(),
        })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert a batch of records
    ///
    /// Records are validated and applied one at a time. The first record that
    /// is not an object, breaks the schema or finds no free auto-increment
    /// key aborts the call; records applied before it stay.
    pub fn insert(
        &mut self,
        name: &str,
        data: &Value,
        auto_increment: bool,
    ) -> Result<Vec<(i64, Record)>> {
        let document = self.document_mut(name)?;
        let batch = entries_in(data, !auto_increment)?;

        let mut inserted = Vec::with_capacity(batch.len());
        for (key, item) in batch {
            let record = as_record(item)?;
            if !document.accepts(&record) {
                return Err(MemDbError::SchemaMismatch {
                    required: document.schema(),
                    received: record.keys().cloned().collect(),
                });
            }

            let key = match key {
                Some(key) if !auto_increment => {
                    document.upsert(key, record.clone());
                    key
                }
                _ => document.push(record.clone())?,
            };
            inserted.push((key, record));
        }

        Ok(inserted)
    }

    /// Patch one record or replace the whole document
    ///
    /// With an `id` and a record object, only fields whose value differs are
    /// written and `data` must carry exactly the schema's fields. Any other
    /// combination replaces the document's records wholesale.
    pub fn update(&mut self, name: &str, id: Option<i64>, data: &Value) -> Result<UpdateOutcome> {
        let document = self.document_mut(name)?;
        if let Some(id) = id {
            if !document.contains_key(id) {
                return Err(MemDbError::KeyNotFound);
            }
        }
        let document_keys = document.schema();

        match (id, data) {
            (Some(id), Value::Object(patch)) => {
                if !document.accepts(patch) {
                    return Err(MemDbError::SchemaMismatch {
                        required: document_keys,
                        received: patch.keys().cloned().collect(),
                    });
                }

                let record = document.get_mut(id).ok_or(MemDbError::KeyNotFound)?;
                let mut changed = Record::new();
                for (field, value) in patch {
                    let differs = record
                        .get(field)
                        .map_or(true, |current| !loose_eq(current, value));
                    if differs {
                        record.insert(field.clone(), value.clone());
                        changed.insert(field.clone(), value.clone());
                    }
                }

                Ok(UpdateOutcome {
                    document_keys,
                    changed: (!changed.is_empty()).then_some((id, changed)),
                    replaced: false,
                })
            }
            _ => {
                *document = Document::from_json(data)?;
                Ok(UpdateOutcome {
                    document_keys,
                    changed: None,
                    replaced: true,
                })
            }
        }
    }

    /// Delete one record and renumber the rest to `0..len-1`
    pub fn delete(&mut self, name: &str, id: i64) -> Result<Record> {
        self.document_mut(name)?
            .remove(id)
            .ok_or(MemDbError::KeyNotFound)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.documents.iter().position(|(n, _)| n == name)
    }
}
