//! TCP Server
//!
//! Single-threaded event loop. Each iteration accepts at most one new
//! client, serves at most one request per open client, flushes pending
//! output, then sleeps for the poll interval.
//!
//! Replication runs inline inside a mutating request, so an unresponsive
//! peer stalls the whole loop unless a replica timeout is configured.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::connection::{Connection, ConnectionEvent};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{decode_request, Inbound, Response};

/// TCP server for memdocdb
pub struct Server {
    listener: TcpListener,
    engine: Engine,
    clients: Vec<Connection>,
    next_client_id: u64,
    poll_interval: Duration,
    max_request_bytes: usize,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listener and take ownership of the engine
    ///
    /// Bind failures are returned to the caller, which treats them as fatal.
    pub fn bind(config: &Config, engine: Engine) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr())?;
        listener.set_nonblocking(true)?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            engine,
            clients: Vec::new(),
            next_client_id: 0,
            poll_interval: config.poll_interval(),
            max_request_bytes: config.max_request_bytes,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops `run` after the current iteration
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Run the loop until the shutdown flag is set
    pub fn run(&mut self) {
        while !self.shutdown.load(Ordering::Relaxed) {
            self.tick();
            thread::sleep(self.poll_interval);
        }

        for client in &mut self.clients {
            client.close();
        }
        self.clients.clear();
        tracing::info!("Server loop stopped");
    }

    /// One loop iteration
    pub fn tick(&mut self) {
        self.accept();
        self.serve_clients();
    }

    fn accept(&mut self) {
        match self.listener.accept() {
            Ok((stream, addr)) => {
                self.next_client_id += 1;
                let id = self.next_client_id;
                match Connection::new(id, stream, self.max_request_bytes) {
                    Ok(client) => {
                        tracing::info!("New client {} connected from {}.", id, addr);
                        self.clients.push(client);
                    }
                    Err(e) => tracing::warn!("Could not set up client {} from {}: {}", id, addr, e),
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => tracing::warn!("Accept failed: {}", e),
        }
    }

    fn serve_clients(&mut self) {
        let engine = &mut self.engine;

        for client in &mut self.clients {
            match client.poll() {
                ConnectionEvent::Idle => {}
                ConnectionEvent::Closed => client.mark_closed(),
                ConnectionEvent::Frame(frame) => match decode_request(&frame) {
                    Ok(Inbound::Quit) => client.mark_closed(),
                    Ok(Inbound::Request(request)) => {
                        tracing::trace!("Received {} from client {}", request.action, client.id());
                        let response = engine.execute(&request);
                        client.queue(&response);
                    }
                    Err(e) if e.is_request_error() => {
                        tracing::debug!("Rejected request from client {}: {}", client.id(), e);
                        client.queue(&Response::from(&e));
                    }
                    Err(e) => {
                        tracing::warn!("Dropping client {}: {}", client.id(), e);
                        client.mark_closed();
                    }
                },
            }

            if !client.has_pending_output() {
                continue;
            }
            if let Err(e) = client.flush() {
                tracing::debug!("Client {} ({}) write failed: {}", client.id(), client.peer_addr(), e);
                client.mark_closed();
            }
        }

        self.clients.retain_mut(|client| {
            if !client.is_closed() {
                return true;
            }
            client.close();
            tracing::info!("Client {} disconnected.", client.id());
            false
        });
    }
}
