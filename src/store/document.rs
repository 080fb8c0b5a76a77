//! Document implementation
//!
//! An insertion-ordered collection of integer-keyed records.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::Record;
use crate::error::{MemDbError, Result};

/// A named collection of records
///
/// Entries keep insertion order; overwriting a key keeps its position.
/// Lookups are linear scans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(i64, Record)>,
}

impl Document {
    /// Create a new empty Document
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the record stored at `key`
    pub fn get(&self, key: i64) -> Option<&Record> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: i64) -> bool {
        self.position(key).is_some()
    }

    /// First entry in iteration order (not necessarily key 0)
    pub fn first(&self) -> Option<(i64, &Record)> {
        self.entries.first().map(|(k, r)| (*k, r))
    }

    /// Field names of the first record, in that record's order
    ///
    /// Empty when the document holds no records.
    pub fn schema(&self) -> Vec<String> {
        self.first()
            .map(|(_, record)| record.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// True when `record` carries exactly the schema's field set, or no
    /// schema is established yet
    pub fn accepts(&self, record: &Record) -> bool {
        match self.first() {
            None => true,
            Some((_, first)) => field_set(first) == field_set(record),
        }
    }

    /// Next auto-increment key
    ///
    /// Fails once `i64::MAX` is taken: there is no key after it.
    pub fn next_key(&self) -> Result<i64> {
        match self.entries.iter().map(|(k, _)| *k).max() {
            None => Ok(0),
            Some(max) => max.checked_add(1).ok_or_else(|| {
                MemDbError::InvalidDataShape("No auto-increment key left in document.".to_string())
            }),
        }
    }

    /// Append under the next auto-increment key, returning that key
    pub fn push(&mut self, record: Record) -> Result<i64> {
        let key = self.next_key()?;
        self.entries.push((key, record));
        Ok(key)
    }

    /// Store `record` at `key`, replacing any record already there
    pub fn upsert(&mut self, key: i64, record: Record) {
        match self.position(key) {
            Some(i) => self.entries[i].1 = record,
            None => self.entries.push((key, record)),
        }
    }

    pub fn get_mut(&mut self, key: i64) -> Option<&mut Record> {
        let i = self.position(key)?;
        Some(&mut self.entries[i].1)
    }

    /// Remove the record at `key` and renumber the rest to `0..len-1`
    pub fn remove(&mut self, key: i64) -> Option<Record> {
        let i = self.position(key)?;
        let (_, record) = self.entries.remove(i);
        for (new_key, entry) in self.entries.iter_mut().enumerate() {
            entry.0 = new_key as i64;
        }
        Some(record)
    }

    /// Drop every record (the schema goes with them)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &Record)> {
        self.entries.iter().map(|(k, r)| (*k, r))
    }

    pub fn keys(&self) -> Vec<i64> {
        self.entries.iter().map(|(k, _)| *k).collect()
    }

    /// Wire form of the whole document
    pub fn to_json(&self) -> Value {
        keyed_to_json(self.iter())
    }

    /// Build a document from its wire form
    ///
    /// Accepts an array (keys `0..n-1`) or an object keyed by integers.
    /// Every entry must be a record object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let mut document = Self::new();
        for (key, item) in entries_in(value, true)? {
            document.upsert(key.unwrap_or_default(), as_record(item)?);
        }
        Ok(document)
    }

    fn position(&self, key: i64) -> Option<usize> {
        self.entries.iter().position(|(k, _)| *k == key)
    }
}

/// Encode keyed records
///
/// Keys `0..n-1` in order become a JSON array; anything else becomes an
/// object with decimal keys. Clients index both forms the same way.
pub fn keyed_to_json<'a>(entries: impl IntoIterator<Item = (i64, &'a Record)>) -> Value {
    let entries: Vec<(i64, &Record)> = entries.into_iter().collect();
    let sequential = entries
        .iter()
        .enumerate()
        .all(|(i, (key, _))| *key == i as i64);

    if sequential {
        Value::Array(
            entries
                .into_iter()
                .map(|(_, record)| Value::Object(record.clone()))
                .collect(),
        )
    } else {
        let mut map = Map::with_capacity(entries.len());
        for (key, record) in entries {
            map.insert(key.to_string(), Value::Object(record.clone()));
        }
        Value::Object(map)
    }
}

/// Split a `data` parameter into keyed entries
///
/// Arrays yield their indexes as keys. Objects yield their keys parsed as
/// integers; a non-integer key is an error when `require_keys` is set and
/// `None` otherwise. Entries are not checked to be records here.
pub(crate) fn entries_in(
    value: &Value,
    require_keys: bool,
) -> Result<Vec<(Option<i64>, &Value)>> {
    match value {
        Value::Array(items) => Ok(items
            .iter()
            .enumerate()
            .map(|(i, item)| (Some(i as i64), item))
            .collect()),
        Value::Object(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, item) in map {
                let key = key.trim().parse::<i64>().ok();
                if key.is_none() && require_keys {
                    return Err(MemDbError::data_not_array());
                }
                entries.push((key, item));
            }
            Ok(entries)
        }
        _ => Err(MemDbError::data_not_array()),
    }
}

/// A single entry as a record
pub(crate) fn as_record(item: &Value) -> Result<Record> {
    match item {
        Value::Object(record) => Ok(record.clone()),
        _ => Err(MemDbError::data_not_array()),
    }
}

fn field_set(record: &Record) -> BTreeSet<&str> {
    record.keys().map(String::as_str).collect()
}
