//! Protocol codec
//!
//! Framing, encoding and decoding for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! {"action":"get","document":"users","id":0}\n      JSON object
//! quit\n                                            closes the connection
//! ```
//! A newline ends a request when present. Older peers send unterminated
//! JSON, so a buffer that already holds one complete JSON value is a
//! request too.
//!
//! Requests must fit on one line: pretty-printed JSON is split at each
//! newline and every line fails to decode on its own.
//!
//! ### Response
//! ```text
//! {"status":"success",...}\n\r
//! ```
//! The terminator is `\n` then `\r`, reversed from the usual order. Readers
//! stop at `\n`; the trailing `\r` leads the next response and is trimmed.

use std::io::{BufRead, Write};

use bytes::{Buf, BytesMut};
use serde::de::IgnoredAny;
use serde_json::Value;

use super::{Request, Response};
use crate::error::{JsonErrorKind, MemDbError, Result};

/// Bytes ending every response
pub const RESPONSE_TERMINATOR: &[u8] = b"\n\r";

/// Bytes ending every request we send
pub const REQUEST_TERMINATOR: &[u8] = b"\n";

/// Message that closes a connection
pub const QUIT: &str = "quit";

/// A decoded inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Quit,
    Request(Request),
}

// =============================================================================
// Framing
// =============================================================================

/// Split the next complete message off `buffer`
///
/// Leading whitespace is discarded. Returns `None` while the buffered bytes
/// are still an incomplete message.
pub fn next_frame(buffer: &mut BytesMut) -> Option<BytesMut> {
    let start = buffer
        .iter()
        .position(|b| !is_blank(*b))
        .unwrap_or(buffer.len());
    buffer.advance(start);

    if buffer.is_empty() {
        return None;
    }

    if let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let mut frame = buffer.split_to(pos + 1);
        frame.truncate(pos);
        return Some(frame);
    }

    if is_complete(buffer) {
        return Some(buffer.split());
    }

    None
}

/// Whether an unterminated buffer already holds a whole message
fn is_complete(bytes: &[u8]) -> bool {
    let text = trim(bytes);
    if QUIT.as_bytes().starts_with(text) {
        return text == QUIT.as_bytes();
    }
    match serde_json::from_slice::<IgnoredAny>(text) {
        Ok(_) => true,
        Err(e) => !e.is_eof(),
    }
}

// =============================================================================
// Request Decoding/Encoding
// =============================================================================

/// Decode one framed inbound message
pub fn decode_request(frame: &[u8]) -> Result<Inbound> {
    let frame = trim(frame);
    if frame == QUIT.as_bytes() {
        return Ok(Inbound::Quit);
    }

    let text = std::str::from_utf8(frame)
        .map_err(|_| MemDbError::MalformedRequest(JsonErrorKind::InvalidEncoding))?;

    let value: Value = serde_json::from_str(text)
        .map_err(|e| MemDbError::MalformedRequest(classify_json_error(&e, text)))?;

    Request::from_value(value).map(Inbound::Request)
}

/// Map a parser failure onto the error kinds reported to clients
pub fn classify_json_error(err: &serde_json::Error, raw: &str) -> JsonErrorKind {
    let message = err.to_string();
    if message.starts_with("recursion limit exceeded") {
        return JsonErrorKind::DepthExceeded;
    }
    if message.contains("control character") {
        return JsonErrorKind::ControlCharacter;
    }
    if message.contains("unicode code point") || message.contains("surrogate") {
        return JsonErrorKind::InvalidEncoding;
    }
    match err.classify() {
        serde_json::error::Category::Syntax | serde_json::error::Category::Eof => {
            JsonErrorKind::Syntax(raw.to_string())
        }
        serde_json::error::Category::Io | serde_json::error::Category::Data => {
            JsonErrorKind::Unknown
        }
    }
}

/// Encode a request for a peer: JSON object + `\n`
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(request)?;
    bytes.extend_from_slice(REQUEST_TERMINATOR);
    Ok(bytes)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response: JSON object + `\n\r`
pub fn encode_response(response: &Response) -> Vec<u8> {
    // A Value built from a map with string keys always serializes
    let mut bytes = serde_json::to_vec(&response.to_value()).unwrap_or_default();
    bytes.extend_from_slice(RESPONSE_TERMINATOR);
    bytes
}

/// Decode a response received from a server
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let value: Value = serde_json::from_slice(trim(bytes))?;
    Response::from_value(value)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    writer.write_all(&encode_request(request)?)?;
    writer.flush()?;
    Ok(())
}

/// Read one response line from a stream
///
/// Blocks until a `\n` arrives. Blank lines left by the `\r` half of the
/// previous terminator are skipped.
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            return Err(MemDbError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before a response arrived",
            )));
        }
        if !trim(&line).is_empty() {
            return decode_response(&line);
        }
    }
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}

fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\0' | 0x0B)
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !is_blank(*b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_blank(*b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}
