//! Protocol Module
//!
//! Defines the wire protocol for client-server and server-server
//! communication.
//!
//! ## Protocol Format (line-delimited JSON)
//!
//! ### Request Format
//! ```text
//! {"action": "...", "document": "...", "id": 0, "query": {...},
//!  "data": [...], "auto-increment": true, "replicate": true}
//! ```
//! Only `action` is required. Unknown fields are ignored.
//!
//! ### Actions
//! - `list`, `getall`                       database level
//! - `create`, `drop`, `empty`              document lifecycle
//! - `get`, `getkeys`, `count`              reads
//! - `insert`, `update`, `delete`           record writes
//!
//! ### Response Format
//! ```text
//! {"status": "success" | "error", "message": "...", ...payload}\n\r
//! ```

mod codec;
mod request;
mod response;

pub use codec::{
    classify_json_error, decode_request, decode_response, encode_request, encode_response,
    next_frame, read_response, write_request, write_response, Inbound, QUIT, REQUEST_TERMINATOR,
    RESPONSE_TERMINATOR,
};
pub use request::{Action, Request};
pub use response::{Response, Status};
