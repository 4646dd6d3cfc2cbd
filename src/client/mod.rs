//! Client Module
//!
//! Connection to the engine's coordination tier and the entry point for
//! everything else.
//!
//! ## Ownership
//! ```text
//! Client ──owns──▶ ClientInner (Arc) ◀──shared── Table, Session, Scanner
//!                     │
//!                     └── Arc<dyn Transport>
//! ```
//!
//! Closing the client marks the shared connection closed; anything still
//! holding it then fails every engine call with `InvalidState`.

mod table;
mod table_creator;

pub use table::Table;
pub use table_creator::TableCreator;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{ClientConfig, HostPort};
use crate::error::{KuduError, Result};
use crate::protocol::{Connector, Request, Response, Transport};
use crate::session::Session;
use crate::status::{self, RpcContext, Status, StatusCode};

const CLOSED_MESSAGE: &str = "the client connection has been closed";

// =============================================================================
// Shared Connection
// =============================================================================

/// Connection state shared by a client and everything derived from it
pub(crate) struct ClientInner {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    master: HostPort,
    closed: AtomicBool,
}

impl ClientInner {
    /// Send one request and check that the reply answers it, keeping the
    /// engine status on failure
    pub(crate) fn call(&self, request: Request) -> std::result::Result<Response, Status> {
        if self.is_closed() {
            return Err(Status::new(StatusCode::IllegalState, CLOSED_MESSAGE));
        }

        let request_type = request.request_type();
        tracing::trace!(?request_type, master = %self.master, "sending request");

        let response = self.transport.call(request)?;
        if !response.answers(request_type) {
            return Err(Status::message_only(format!(
                "unexpected response to {:?}",
                request_type
            )));
        }
        Ok(response)
    }

    /// [`call`](Self::call), with failures translated for the given context
    pub(crate) fn rpc(&self, request: Request, context: RpcContext) -> Result<Response> {
        if self.is_closed() {
            return Err(KuduError::InvalidState(CLOSED_MESSAGE.to_string()));
        }
        self.call(request)
            .map_err(|status| status::translate(status, context))
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns false if already closed
    fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }
}

// =============================================================================
// Client Builder
// =============================================================================

/// Builds a [`Client`] by resolving masters and performing the handshake
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    connector: Option<Arc<dyn Connector>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add_master_server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.master_addrs.push(addr.into());
        self
    }

    pub fn master_server_addrs<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.master_addrs = addrs.into_iter().map(Into::into).collect();
        self
    }

    /// How to reach the engine
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Resolve each master in order and connect to the first that completes
    /// the handshake
    pub fn build(self) -> Result<Client> {
        let connector = self.connector.ok_or_else(|| {
            KuduError::Connection("no connector configured for the client".to_string())
        })?;
        let masters = self.config.resolve_masters()?;

        let mut failures = Vec::with_capacity(masters.len());
        for master in masters {
            match connector.connect(&master) {
                Ok(transport) => {
                    tracing::info!(%master, "connected to master");
                    return Ok(Client {
                        inner: Arc::new(ClientInner {
                            transport,
                            config: self.config,
                            master,
                            closed: AtomicBool::new(false),
                        }),
                    });
                }
                Err(status) => {
                    tracing::warn!(%master, %status, "master handshake failed");
                    failures.push(format!("{}: {}", master, status));
                }
            }
        }

        Err(status::translate(
            Status::network_error(format!(
                "could not connect to any master: {}",
                failures.join("; ")
            )),
            RpcContext::Connect,
        ))
    }
}

// =============================================================================
// Client
// =============================================================================

/// A connection to the engine.
///
/// Closed exactly once, either by [`Client::close`] or on drop.
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        self.inner
            .rpc(
                Request::TableExists {
                    name: name.to_string(),
                },
                RpcContext::Catalog,
            )?
            .into_exists()
            .map_err(|status| status::translate(status, RpcContext::Catalog))
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut names = self
            .inner
            .rpc(Request::ListTables, RpcContext::Catalog)?
            .into_tables()
            .map_err(|status| status::translate(status, RpcContext::Catalog))?;
        names.sort();
        Ok(names)
    }

    /// Open an existing table
    pub fn open_table(&self, name: &str) -> Result<Table> {
        let metadata = self
            .inner
            .rpc(
                Request::OpenTable {
                    name: name.to_string(),
                },
                RpcContext::Catalog,
            )?
            .into_table()
            .map_err(|status| status::translate(status, RpcContext::Catalog))?;
        tracing::debug!(table = %metadata.name, id = %metadata.id, "opened table");
        Ok(Table::new(Arc::clone(&self.inner), metadata))
    }

    pub fn delete_table(&self, name: &str) -> Result<()> {
        self.inner.rpc(
            Request::DeleteTable {
                name: name.to_string(),
            },
            RpcContext::Catalog,
        )?;
        tracing::info!(table = name, "deleted table");
        Ok(())
    }

    pub fn new_table_creator(&self) -> TableCreator {
        TableCreator::new(Arc::clone(&self.inner))
    }

    /// A new write session using the configured default flush mode
    pub fn new_session(&self) -> Session {
        Session::new(Arc::clone(&self.inner))
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    /// The master the handshake succeeded against
    pub fn master_addr(&self) -> &HostPort {
        &self.inner.master
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Close the connection. Tables, sessions and scanners created from this
    /// client must not be used afterwards; their engine calls fail with
    /// `InvalidState`.
    pub fn close(self) {
        // Drop performs the release
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if self.inner.close() {
            tracing::info!(master = %self.inner.master, "client closed");
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("master", &self.inner.master)
            .field("closed", &self.is_closed())
            .finish()
    }
}
