//! Error types for memdocdb
//!
//! Provides a unified error type for all operations. Every variant in the
//! request section renders to the exact message sent back to clients.

use thiserror::Error;

/// Result type alias using MemDbError
pub type Result<T> = std::result::Result<T, MemDbError>;

/// Why a request failed to decode as JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonErrorKind {
    /// Nesting deeper than the parser allows
    DepthExceeded,

    /// Not valid JSON; carries the raw request text
    Syntax(String),

    /// Unescaped control character inside a string
    ControlCharacter,

    /// Request bytes are not valid UTF-8
    InvalidEncoding,

    /// Anything the parser reports that fits none of the above
    Unknown,
}

impl std::fmt::Display for JsonErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonErrorKind::DepthExceeded => write!(f, "Maximum stack depth exceeded."),
            JsonErrorKind::Syntax(raw) => write!(f, "Syntax error, malformed JSON. <{}>", raw),
            JsonErrorKind::ControlCharacter => write!(f, "Unexpected control character found."),
            JsonErrorKind::InvalidEncoding => {
                write!(f, "Malformed UTF-8 characters, possibly incorrectly encoded.")
            }
            JsonErrorKind::Unknown => write!(f, "Unknown JSON error occured."),
        }
    }
}

/// Unified error type for memdocdb operations
#[derive(Debug, Error)]
pub enum MemDbError {
    // -------------------------------------------------------------------------
    // Request Errors (reported to the client, connection stays open)
    // -------------------------------------------------------------------------
    #[error("{0}")]
    MalformedRequest(JsonErrorKind),

    #[error("No action key provided.")]
    MissingAction,

    #[error("The action '{0}' provided is not valid.")]
    UnknownAction(String),

    #[error("{}", .0.message())]
    MissingParameter(Parameter),

    #[error("Document provided does not exist.")]
    NotFound,

    #[error("Document provided already exist.")]
    AlreadyExists,

    #[error("Key:id provided does not exist in document.")]
    KeyNotFound,

    #[error(
        "The required keys for this document are: {}, received: {}.",
        .required.join(", "),
        .received.join(", ")
    )]
    SchemaMismatch {
        required: Vec<String>,
        received: Vec<String>,
    },

    #[error("{0}")]
    InvalidDataShape(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Replication Errors
    // -------------------------------------------------------------------------
    #[error("Replication error: {0}")]
    Replication(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A request parameter that an action requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Document,
    Data,
    Id,
}

impl Parameter {
    fn message(&self) -> &'static str {
        match self {
            Parameter::Document => "No document provided.",
            Parameter::Data => "No data provided.",
            Parameter::Id => "No id provided or not numeric value.",
        }
    }
}

impl MemDbError {
    /// Data shape error with the standard message
    pub fn data_not_array() -> Self {
        MemDbError::InvalidDataShape("Data must be provided in array.".to_string())
    }

    /// True for errors caused by the request itself rather than the transport
    pub fn is_request_error(&self) -> bool {
        !matches!(
            self,
            MemDbError::Io(_)
                | MemDbError::Serialization(_)
                | MemDbError::Replication(_)
                | MemDbError::Config(_)
        )
    }
}
