//! # memdocdb
//!
//! A lightweight in-memory document database with:
//! - Named documents of integer-keyed JSON records
//! - Implicit per-document schema taken from the first record
//! - Field-equality queries with loose comparison
//! - Line-delimited JSON over raw TCP
//! - Best-effort synchronous replication to static peers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TCP Event Loop                             │
//! │          (one thread, non-blocking clients)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Engine (dispatch)                          │
//! │            action → store operation                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │  Database   │          │ Replication  │
//!   │ (+ Query)   │          │  (peers)     │
//!   └─────────────┘          └──────────────┘
//! ```
//!
//! Nothing is persisted: data lives as long as the process.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod network;
pub mod protocol;
pub mod replication;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, ReplicaConfig};
pub use engine::Engine;
pub use error::{MemDbError, Result};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of memdocdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
