//! Configuration for memdocdb
//!
//! Centralized configuration with sensible defaults. Files are JSON; the
//! legacy `server_path` key is accepted for the server root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{MemDbError, Result};

/// Name of the config file looked up in the server root
pub const DEFAULT_CONFIG_FILE: &str = "memdocdb.json";

/// Main configuration for a memdocdb node
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Listen IP (`0.0.0.0` listens on every local address)
    pub ip: String,

    /// Listen port
    pub port: u16,

    /// Event loop sleep between iterations (milliseconds)
    pub poll_interval_ms: u64,

    /// Largest request accepted from a client, in bytes
    pub max_request_bytes: usize,

    // -------------------------------------------------------------------------
    // Replication Configuration
    // -------------------------------------------------------------------------
    /// Peers receiving mirrored mutations. May list this node too.
    pub replicas: Vec<ReplicaConfig>,

    /// Bound on peer connect/read/write. `None` blocks until the peer answers.
    pub replica_timeout_ms: Option<u64>,

    // -------------------------------------------------------------------------
    // Process Configuration
    // -------------------------------------------------------------------------
    /// Directory the server runs from; the default config file lives here
    #[serde(alias = "server_path")]
    pub server_root: PathBuf,
}

/// A single replica endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplicaConfig {
    pub ip: String,
    pub port: u16,
}

impl ReplicaConfig {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self { ip: ip.into(), port }
    }

    /// `host:port` form used for connecting and logging
    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl std::str::FromStr for ReplicaConfig {
    type Err = MemDbError;

    fn from_str(s: &str) -> Result<Self> {
        let (ip, port) = s
            .rsplit_once(':')
            .ok_or_else(|| MemDbError::Config(format!("replica '{}' is not host:port", s)))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| MemDbError::Config(format!("replica '{}' has an invalid port", s)))?;
        Ok(Self::new(ip, port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ip: "0.0.0.0".to_string(),
            port: 8888,
            poll_interval_ms: 1,
            max_request_bytes: 1024 * 1024, // 1 MB
            replicas: Vec::new(),
            replica_timeout_ms: None,
            server_root: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MemDbError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            MemDbError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_request_bytes == 0 {
            return Err(MemDbError::Config(
                "max_request_bytes must be greater than zero".to_string(),
            ));
        }
        for replica in &self.replicas {
            if replica.ip.trim().is_empty() {
                return Err(MemDbError::Config("replica with an empty ip".to_string()));
            }
            if replica.port == 0 {
                return Err(MemDbError::Config(format!(
                    "replica {} has port 0",
                    replica.ip
                )));
            }
        }
        Ok(())
    }

    /// TCP listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn replica_timeout(&self) -> Option<Duration> {
        self.replica_timeout_ms.map(Duration::from_millis)
    }

    /// Path of the config file inside the server root
    pub fn default_file(&self) -> PathBuf {
        self.server_root.join(DEFAULT_CONFIG_FILE)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the listen IP
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.config.ip = ip.into();
        self
    }

    /// Set the listen port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Add a replica endpoint
    pub fn replica(mut self, ip: impl Into<String>, port: u16) -> Self {
        self.config.replicas.push(ReplicaConfig::new(ip, port));
        self
    }

    /// Replace the replica list
    pub fn replicas(mut self, replicas: Vec<ReplicaConfig>) -> Self {
        self.config.replicas = replicas;
        self
    }

    /// Set the event loop sleep (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the largest accepted request (in bytes)
    pub fn max_request_bytes(mut self, bytes: usize) -> Self {
        self.config.max_request_bytes = bytes;
        self
    }

    /// Bound every peer exchange (in milliseconds)
    pub fn replica_timeout_ms(mut self, ms: u64) -> Self {
        self.config.replica_timeout_ms = Some(ms);
        self
    }

    /// Set the server root directory
    pub fn server_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.server_root = path.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
