//! Request definitions
//!
//! Represents commands from clients and peers.

use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{MemDbError, Result};
use crate::store::value::{coerce_int, is_truthy};

/// Action names accepted on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    List,
    GetAll,
    Get,
    GetKeys,
    Insert,
    Update,
    Delete,
    Create,
    Empty,
    Drop,
    Count,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::List,
        Action::GetAll,
        Action::Get,
        Action::GetKeys,
        Action::Insert,
        Action::Update,
        Action::Delete,
        Action::Create,
        Action::Empty,
        Action::Drop,
        Action::Count,
    ];

    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::GetAll => "getall",
            Action::Get => "get",
            Action::GetKeys => "getkeys",
            Action::Insert => "insert",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Create => "create",
            Action::Empty => "empty",
            Action::Drop => "drop",
            Action::Count => "count",
        }
    }

    /// Actions that change the store and are forwarded to peers
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Action::Create
                | Action::Insert
                | Action::Update
                | Action::Delete
                | Action::Drop
                | Action::Empty
        )
    }
}

impl FromStr for Action {
    type Err = MemDbError;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| MemDbError::UnknownAction(s.to_string()))
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed request
///
/// Only the recognised parameters survive parsing; JSON `null` counts as
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub action: Action,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,

    /// Record key, already coerced to an integer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(rename = "auto-increment", skip_serializing_if = "Option::is_none")]
    pub auto_increment: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicate: Option<bool>,
}

impl Request {
    /// Create a request with no parameters
    pub fn new(action: Action) -> Self {
        Self {
            action,
            document: None,
            id: None,
            query: None,
            data: None,
            auto_increment: None,
            replicate: None,
        }
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = Some(auto_increment);
        self
    }

    pub fn with_replicate(mut self, replicate: bool) -> Self {
        self.replicate = Some(replicate);
        self
    }

    /// Parse a decoded JSON message
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(MemDbError::MissingAction);
        };

        let action = match fields.remove("action") {
            None | Some(Value::Null) => return Err(MemDbError::MissingAction),
            Some(Value::String(name)) => name.parse::<Action>()?,
            Some(other) => return Err(MemDbError::UnknownAction(other.to_string())),
        };

        Ok(Self {
            action,
            document: take(&mut fields, "document").and_then(|v| match v {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
            id: take(&mut fields, "id").as_ref().and_then(coerce_int),
            query: take(&mut fields, "query"),
            data: take(&mut fields, "data"),
            auto_increment: take(&mut fields, "auto-increment").map(|v| is_truthy(&v)),
            replicate: take(&mut fields, "replicate").map(|v| is_truthy(&v)),
        })
    }

    /// The same request as sent to a peer: never forwarded again
    pub fn for_peer(&self) -> Self {
        let mut request = self.clone();
        request.replicate = Some(false);
        request
    }

    /// Absent `replicate` means replicate
    pub fn should_replicate(&self) -> bool {
        self.replicate.unwrap_or(true)
    }
}

fn take(fields: &mut Map<String, Value>, key: &str) -> Option<Value> {
    fields.remove(key).filter(|v| !v.is_null())
}
