//! Engine Module
//!
//! Command dispatch: routes a parsed request to the document store, shapes
//! the response payload and drives replication for mutations.
//!
//! ## Responsibilities
//! - Check the parameters each action requires
//! - Run the store operation
//! - Fan successful mutations out to peers
//! - Turn every failure into an error response
//!
//! The engine owns the database. The event loop owns the engine, so all
//! requests are applied one at a time and no locking is needed.

use serde_json::Value;

use crate::error::{MemDbError, Parameter, Result};
use crate::protocol::{Action, Request, Response};
use crate::replication::ReplicationManager;
use crate::store::{keyed_to_json, Database, Query};

/// The command dispatcher and the state it serves
pub struct Engine {
    /// Every document this node holds
    database: Database,

    /// Peers receiving mutations
    replication: ReplicationManager,
}

impl Engine {
    pub fn new(replication: ReplicationManager) -> Self {
        Self {
            database: Database::new(),
            replication,
        }
    }

    /// An engine with no replicas
    pub fn standalone() -> Self {
        Self::new(ReplicationManager::disabled())
    }

    /// Read access to the stored documents
    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn replication(&self) -> &ReplicationManager {
        &self.replication
    }

    /// Copy in documents from peers; returns how many were taken
    pub fn bootstrap(&mut self) -> usize {
        self.replication.bootstrap(&mut self.database)
    }

    /// Execute a request
    ///
    /// Never fails: errors become `{"status":"error","message":...}`.
    pub fn execute(&mut self, request: &Request) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                if e.is_request_error() {
                    tracing::debug!("{} rejected: {}", request.action, e);
                } else {
                    tracing::warn!("{} failed: {}", request.action, e);
                }
                Response::from(&e)
            }
        }
    }

    fn dispatch(&mut self, request: &Request) -> Result<Response> {
        let response = match request.action {
            Action::List => Response::success().with("documents", self.database.list()),
            Action::GetAll => Response::success()
                .with("documents", self.database.snapshot())
                .with("replicated", request.should_replicate()),
            Action::Get => self.get(request)?,
            Action::GetKeys => self.get_keys(request)?,
            Action::Count => self.count(request)?,
            Action::Create => {
                self.database.create_document(document(request)?)?;
                Response::success()
            }
            Action::Drop => {
                self.database.drop_document(document(request)?)?;
                Response::success()
            }
            Action::Empty => {
                self.database.empty_document(document(request)?)?;
                Response::success()
            }
            Action::Insert => self.insert(request)?,
            Action::Update => self.update(request)?,
            Action::Delete => {
                let name = document(request)?;
                let id = request.id.ok_or(MemDbError::MissingParameter(Parameter::Id))?;
                self.database.delete(name, id)?;
                Response::success()
            }
        };

        if request.action.is_mutation() {
            let replicated = self.replication.fan_out(request);
            return Ok(response.with("replicated", replicated));
        }
        Ok(response)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    fn get(&self, request: &Request) -> Result<Response> {
        let name = document(request)?;
        let query = match (request.id, &request.query) {
            (None, Some(query)) => Some(Query::from_value(query)?),
            _ => None,
        };

        let records = self.database.get(name, request.id, query.as_ref())?;
        let whole_document = request.id.is_none() && query.is_none();

        let response = Response::success();
        if whole_document || !records.is_empty() {
            return Ok(response.with("data", keyed_to_json(records)));
        }
        Ok(response)
    }

    fn get_keys(&self, request: &Request) -> Result<Response> {
        let (first_key, fields) = match self.database.get_keys(document(request)?)? {
            Some((key, fields)) => (Value::from(key), fields),
            None => (Value::Null, Vec::new()),
        };
        Ok(Response::success()
            .with("document_keys", fields)
            .with("document_first_key", first_key))
    }

    fn count(&self, request: &Request) -> Result<Response> {
        let name = document(request)?;
        let query = request.query.as_ref().map(Query::from_value).transpose()?;
        let count = self.database.count(name, query.as_ref())?;
        Ok(Response::success().with("count", count))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    fn insert(&mut self, request: &Request) -> Result<Response> {
        let name = document(request)?;
        let data = data(request)?;
        let auto_increment = request.auto_increment.unwrap_or(true);

        let inserted = self.database.insert(name, data, auto_increment)?;
        let echoed = if auto_increment {
            Value::Array(inserted.into_iter().map(|(_, r)| Value::Object(r)).collect())
        } else {
            keyed_to_json(inserted.iter().map(|(k, r)| (*k, r)))
        };

        Ok(Response::success().with("data_interted", echoed))
    }

    fn update(&mut self, request: &Request) -> Result<Response> {
        let name = document(request)?;
        let data = data(request)?;

        let outcome = self.database.update(name, request.id, data)?;
        let updated = keyed_to_json(outcome.changed.iter().map(|(k, r)| (*k, r)));

        Ok(Response::success()
            .with("document_keys", outcome.document_keys)
            .with("updated_data", updated))
    }
}

fn document(request: &Request) -> Result<&str> {
    request
        .document
        .as_deref()
        .ok_or(MemDbError::MissingParameter(Parameter::Document))
}

fn data(request: &Request) -> Result<&Value> {
    request
        .data
        .as_ref()
        .ok_or(MemDbError::MissingParameter(Parameter::Data))
}
