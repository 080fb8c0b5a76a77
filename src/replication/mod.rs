//! Replication Module
//!
//! Best-effort, synchronous mirroring to a static set of peers.
//!
//! ## Protocol
//! - Startup: `getall` with `replicate=false` from each peer; documents the
//!   node lacks are copied in (first writer wins)
//! - Each successful local mutation is re-sent to every peer with
//!   `replicate=false`, so peers never forward it again
//! - The sender blocks on each peer's response line
//!
//! No conflict detection, no retries, no rollback.

mod manager;
mod peer;

pub use manager::ReplicationManager;
pub use peer::{Peer, PeerState};
