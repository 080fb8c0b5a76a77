//! Response definitions
//!
//! Represents responses to clients: a status plus action-specific fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MemDbError, Result};

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
        }
    }
}

/// A response to send to a client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Payload fields, in the order they were added
    pub fields: Map<String, Value>,
}

impl Response {
    /// Create a success response with no payload
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            fields: Map::new(),
        }
    }

    /// Create an error response
    pub fn error(message: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("message".to_string(), Value::String(message.into()));
        Self {
            status: Status::Error,
            fields,
        }
    }

    /// Add a payload field
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Error message, if any
    pub fn message(&self) -> Option<&str> {
        self.fields.get("message").and_then(Value::as_str)
    }

    /// Wire form: `status` first, then the payload fields
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert("status".to_string(), Value::from(self.status.as_str()));
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    /// Parse a response received from a server
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(MemDbError::Replication(
                "response is not a JSON object".to_string(),
            ));
        };
        let status = fields
            .remove("status")
            .ok_or_else(|| MemDbError::Replication("response has no status".to_string()))?;
        let status: Status = serde_json::from_value(status)?;
        Ok(Self { status, fields })
    }
}

impl From<&MemDbError> for Response {
    fn from(err: &MemDbError) -> Self {
        Response::error(err.to_string())
    }
}
