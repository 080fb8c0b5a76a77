//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - One thread runs the event loop: accept, poll each client, flush
//! - Sockets are non-blocking; requests are processed in arrival order
//! - Commands routed through Engine
//! - `Client` is the blocking counterpart used by peers and the CLI

mod client;
mod connection;
mod local_addr;
mod server;

pub use client::Client;
pub use connection::{Connection, ConnectionEvent};
pub use local_addr::{detect_local_ip, loopback, resolve_local_ip, LocalAddrDetector};
pub use server::Server;
