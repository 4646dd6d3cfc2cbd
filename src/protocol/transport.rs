//! Engine boundary traits

use std::sync::Arc;

use crate::config::HostPort;
use crate::status::Status;

use super::{Request, Response};

/// A connection to the engine.
///
/// Implementations must be usable from several threads at once: one client
/// connection backs every session, scanner and background flusher created
/// from it.
pub trait Transport: Send + Sync {
    /// Perform one blocking request/response exchange
    fn call(&self, request: Request) -> Result<Response, Status>;
}

/// Resolves a master address and performs the connection handshake
pub trait Connector: Send + Sync {
    fn connect(&self, master: &HostPort) -> Result<Arc<dyn Transport>, Status>;
}
