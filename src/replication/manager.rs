//! Replication manager
//!
//! Pulls peer state once at startup and pushes every local mutation to all
//! peers. Best effort: failures are logged, never retried and never undo
//! the local change.

use std::net::IpAddr;

use serde_json::Value;

use super::peer::Peer;
use crate::config::{Config, ReplicaConfig};
use crate::network::{resolve_local_ip, LocalAddrDetector};
use crate::protocol::{Action, Request};
use crate::store::{Database, Document};

/// Peer registry plus the replication protocol
pub struct ReplicationManager {
    /// Configured replicas other than this node
    peers: Vec<Peer>,

    /// Number of configured replicas, this node included
    configured: usize,
}

impl ReplicationManager {
    /// Build the registry from `config`, skipping entries that are this node
    pub fn new(config: &Config, detect: LocalAddrDetector) -> Self {
        let local_ip = resolve_local_ip(detect);
        if !config.replicas.is_empty() {
            tracing::info!("Local IP: {}.", local_ip);
        }

        let peers = config
            .replicas
            .iter()
            .filter(|replica| !is_self(replica, local_ip, config))
            .map(|replica| Peer::new(replica.clone(), config.replica_timeout()))
            .collect();

        Self {
            peers,
            configured: config.replicas.len(),
        }
    }

    /// A manager with no replicas
    pub fn disabled() -> Self {
        Self::new(&Config::default(), crate::network::loopback)
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn configured_count(&self) -> usize {
        self.configured
    }

    /// Connect to every peer and copy in the documents this node lacks
    ///
    /// A local document always wins over a peer's document of the same
    /// name. Returns the number of documents taken.
    pub fn bootstrap(&mut self, database: &mut Database) -> usize {
        let mut merged = 0;

        for peer in &mut self.peers {
            let addr = peer.endpoint().addr();
            if let Err(e) = peer.connect() {
                tracing::warn!("Could not connect to replica {}: {}", addr, e);
                continue;
            }
            tracing::info!("Connected to replica {}.", addr);

            let request = Request::new(Action::GetAll).with_replicate(false);
            let response = match peer.call(&request) {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("getall failed on replica {}: {}", addr, e);
                    continue;
                }
            };

            if !response.is_success() {
                tracing::warn!(
                    "getall error from replica {}. Reason: {}",
                    addr,
                    response.message().unwrap_or("unknown")
                );
                continue;
            }

            // An empty database may arrive as `[]`
            let documents = match response.get("documents") {
                Some(Value::Object(documents)) => documents,
                Some(Value::Array(items)) if items.is_empty() => {
                    tracing::info!("Replica {} holds no documents.", addr);
                    continue;
                }
                _ => {
                    tracing::warn!("No documents key received from replica {}.", addr);
                    continue;
                }
            };

            for (name, data) in documents {
                match Document::from_json(data) {
                    Ok(document) => {
                        if database.merge_document(name, document) {
                            merged += 1;
                            tracing::info!("Replicated document {}.", name);
                        }
                    }
                    Err(e) => tracing::warn!(
                        "Skipping document {} from replica {}: {}",
                        name,
                        addr,
                        e
                    ),
                }
            }
            tracing::info!("Documents received from replica {} and stored.", addr);
        }

        merged
    }

    /// Forward a locally applied mutation to every peer
    ///
    /// Returns whether replication was attempted: the request did not opt
    /// out and at least one replica is configured. Peer outcomes do not
    /// change the result.
    pub fn fan_out(&mut self, request: &Request) -> bool {
        if !request.should_replicate() || self.configured == 0 {
            return false;
        }

        let forwarded = request.for_peer();
        for peer in &mut self.peers {
            let addr = peer.endpoint().addr();
            match peer.call(&forwarded) {
                Ok(response) if response.is_success() => {
                    tracing::debug!("Replicated {} to {}", request.action, addr);
                }
                Ok(response) => tracing::warn!(
                    "Could not {} on replica {}. Reason: {}",
                    request.action,
                    addr,
                    response.message().unwrap_or("unknown")
                ),
                Err(e) => tracing::warn!("Could not sync to replica {}: {}", addr, e),
            }
        }

        true
    }
}

/// A replica entry is this node when it names our port on one of our
/// addresses
fn is_self(replica: &ReplicaConfig, local_ip: IpAddr, config: &Config) -> bool {
    if replica.port != config.port {
        return false;
    }
    if replica.ip == config.ip || replica.ip.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match replica.ip.parse::<IpAddr>() {
        Ok(ip) => ip == local_ip || ip.is_loopback(),
        Err(_) => false,
    }
}
