//! Client
//!
//! Blocking request/response client. Peers use it for replication and the
//! CLI uses it to talk to a server.

use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{MemDbError, Result};
use crate::protocol::{read_response, write_request, Request, Response, QUIT};

/// A connection to a memdocdb server
pub struct Client {
    /// TCP stream reader (buffered for line reads)
    reader: BufReader<TcpStream>,

    /// TCP stream writer
    writer: BufWriter<TcpStream>,

    /// Server address for logging
    peer_addr: String,
}

impl Client {
    /// Connect with no timeout
    pub fn connect(addr: &str) -> Result<Self> {
        Self::connect_timeout(addr, None)
    }

    /// Connect, bounding connect/read/write by `timeout` when given
    pub fn connect_timeout(addr: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut last_err = None;
        for socket_addr in addr.to_socket_addrs()? {
            let attempt = match timeout {
                Some(t) => TcpStream::connect_timeout(&socket_addr, t),
                None => TcpStream::connect(socket_addr),
            };
            match attempt {
                Ok(stream) => return Self::from_stream(stream, addr, timeout),
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => MemDbError::Io(e),
            None => MemDbError::Config(format!("address '{}' resolves to nothing", addr)),
        })
    }

    fn from_stream(stream: TcpStream, addr: &str, timeout: Option<Duration>) -> Result<Self> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            peer_addr: addr.to_string(),
        })
    }

    /// Send a request and wait for its response
    pub fn send(&mut self, request: &Request) -> Result<Response> {
        write_request(&mut self.writer, request)?;
        read_response(&mut self.reader)
    }

    /// Send raw request text (a newline is appended) and wait for the response
    pub fn send_raw(&mut self, text: &str) -> Result<Response> {
        self.writer.write_all(text.trim_end().as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        read_response(&mut self.reader)
    }

    /// Ask the server to close the connection
    pub fn quit(mut self) -> Result<()> {
        self.writer.write_all(QUIT.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Get the server address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
