//! Peer connection
//!
//! One configured replica and its lazily (re)established connection.

use std::time::Duration;

use crate::config::ReplicaConfig;
use crate::error::{MemDbError, Result};
use crate::network::Client;
use crate::protocol::{Request, Response};

/// Connection state of a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Disconnected,
    Connecting,
    Connected,
}

/// A replica this node forwards mutations to
pub struct Peer {
    endpoint: ReplicaConfig,
    client: Option<Client>,
    state: PeerState,
    timeout: Option<Duration>,
}

impl Peer {
    pub fn new(endpoint: ReplicaConfig, timeout: Option<Duration>) -> Self {
        Self {
            endpoint,
            client: None,
            state: PeerState::Disconnected,
            timeout,
        }
    }

    pub fn endpoint(&self) -> &ReplicaConfig {
        &self.endpoint
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    /// Open a fresh connection, replacing any existing one
    pub fn connect(&mut self) -> Result<()> {
        self.state = PeerState::Connecting;
        match Client::connect_timeout(&self.endpoint.addr(), self.timeout) {
            Ok(client) => {
                self.client = Some(client);
                self.state = PeerState::Connected;
                Ok(())
            }
            Err(e) => {
                self.disconnect();
                Err(e)
            }
        }
    }

    /// Connect only if there is no open connection
    pub fn ensure_connected(&mut self) -> Result<()> {
        if self.client.is_none() {
            self.connect()?;
        }
        Ok(())
    }

    /// Send one request and block until the peer answers
    ///
    /// A transport failure drops the connection so the next call reconnects.
    pub fn call(&mut self, request: &Request) -> Result<Response> {
        self.ensure_connected()?;

        let result = match self.client.as_mut() {
            Some(client) => client.send(request),
            None => Err(MemDbError::Replication(format!(
                "no connection to {}",
                self.endpoint.addr()
            ))),
        };

        if result.is_err() {
            self.disconnect();
        }
        result
    }

    pub fn disconnect(&mut self) {
        self.client = None;
        self.state = PeerState::Disconnected;
    }
}
