//! Connection Handler
//!
//! Non-blocking state for one client: buffered input awaiting a complete
//! request and buffered output awaiting a writable socket.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;

use bytes::{Buf, BytesMut};

use crate::error::Result;
use crate::protocol::{encode_response, next_frame, Response};

/// Size of a single socket read
const READ_CHUNK: usize = 16 * 1024;

/// What one poll of a connection produced
#[derive(Debug)]
pub enum ConnectionEvent {
    /// Nothing complete yet
    Idle,

    /// One complete request frame
    Frame(BytesMut),

    /// The client went away
    Closed,
}

/// Handles a single client connection
pub struct Connection {
    /// Sequential id, for logging
    id: u64,

    /// Non-blocking TCP stream
    stream: TcpStream,

    /// Bytes read but not yet framed
    inbound: BytesMut,

    /// Encoded responses not yet written
    outbound: BytesMut,

    /// Peer address for logging
    peer_addr: String,

    /// Largest request kept in `inbound`
    max_request_bytes: usize,

    /// Zero-length read seen
    eof: bool,

    /// Marked for removal by the event loop
    closed: bool,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Switches the stream to non-blocking mode.
    pub fn new(id: u64, stream: TcpStream, max_request_bytes: usize) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;

        Ok(Self {
            id,
            stream,
            inbound: BytesMut::with_capacity(READ_CHUNK),
            outbound: BytesMut::new(),
            peer_addr,
            max_request_bytes,
            eof: false,
            closed: false,
        })
    }

    /// Read whatever is available and return at most one request
    pub fn poll(&mut self) -> ConnectionEvent {
        if !self.eof {
            let mut chunk = [0u8; READ_CHUNK];
            while self.inbound.len() < self.max_request_bytes {
                match self.stream.read(&mut chunk) {
                    Ok(0) => {
                        self.eof = true;
                        break;
                    }
                    Ok(n) => self.inbound.extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::debug!("Read error from client {} ({}): {}", self.id, self.peer_addr, e);
                        return ConnectionEvent::Closed;
                    }
                }
            }
        }

        if let Some(frame) = next_frame(&mut self.inbound) {
            return ConnectionEvent::Frame(frame);
        }
        if self.eof {
            return ConnectionEvent::Closed;
        }
        if self.inbound.len() >= self.max_request_bytes {
            // Oversized and still incomplete: hand it over to fail decoding
            return ConnectionEvent::Frame(self.inbound.split());
        }
        ConnectionEvent::Idle
    }

    /// Queue a response for the next flush
    pub fn queue(&mut self, response: &Response) {
        self.outbound.extend_from_slice(&encode_response(response));
    }

    /// Write as much queued output as the socket accepts
    pub fn flush(&mut self) -> Result<()> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => return Err(std::io::Error::from(ErrorKind::WriteZero).into()),
                Ok(n) => self.outbound.advance(n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn has_pending_output(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Mark for removal after this loop iteration
    pub fn mark_closed(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Flush what the socket takes right now and shut it down
    pub fn close(&mut self) {
        let _ = self.flush();
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
