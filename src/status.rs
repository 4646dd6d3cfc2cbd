//! Engine status and translation
//!
//! The engine reports failures as a [`Status`]: a message and, when the engine
//! provides one, a structured [`StatusCode`]. Nothing outside this module
//! turns a `Status` into a [`KuduError`]; callers go through [`translate`]
//! with the [`RpcContext`] they were in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::KuduError;

/// Structured failure codes an engine may attach to a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    NotFound,
    AlreadyPresent,
    InvalidArgument,
    IllegalState,
    NetworkError,
    TimedOut,
    ServiceUnavailable,
    Aborted,
    RuntimeError,
    NotSupported,
}

impl StatusCode {
    fn as_str(&self) -> &'static str {
        match self {
            StatusCode::NotFound => "Not found",
            StatusCode::AlreadyPresent => "Already present",
            StatusCode::InvalidArgument => "Invalid argument",
            StatusCode::IllegalState => "Illegal state",
            StatusCode::NetworkError => "Network error",
            StatusCode::TimedOut => "Timed out",
            StatusCode::ServiceUnavailable => "Service unavailable",
            StatusCode::Aborted => "Aborted",
            StatusCode::RuntimeError => "Runtime error",
            StatusCode::NotSupported => "Not implemented",
        }
    }

    fn is_network(&self) -> bool {
        matches!(
            self,
            StatusCode::NetworkError | StatusCode::TimedOut | StatusCode::ServiceUnavailable
        )
    }
}

/// A failure reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    code: Option<StatusCode>,
    message: String,
}

impl Status {
    /// A status with a structured code
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// A status carrying only a message
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    pub fn already_present(message: impl Into<String>) -> Self {
        Self::new(StatusCode::AlreadyPresent, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    pub fn network_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NetworkError, message)
    }

    pub fn code(&self) -> Option<StatusCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Some(StatusCode::NotFound)
    }

    pub fn is_already_present(&self) -> bool {
        self.code == Some(StatusCode::AlreadyPresent)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}: {}", code.as_str(), self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// The client-side operation a status was received in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcContext {
    /// Master resolution and handshake
    Connect,
    /// Table provisioning
    CreateTable,
    /// Table existence check, listing, open and delete
    Catalog,
    /// Write batch transmission
    Write,
    /// Opening a scan
    ScanOpen,
    /// Fetching a page from an open cursor, or releasing it
    ScanFetch,
}

/// Convert an engine status into the crate error.
///
/// The message is always kept as the error detail. The code, when the engine
/// supplied one, refines the kind; when it is absent the context decides.
pub fn translate(status: Status, context: RpcContext) -> KuduError {
    let detail = status.to_string();
    match (context, status.code) {
        (RpcContext::Connect, _) => KuduError::Connection(detail),
        (RpcContext::CreateTable, _) => KuduError::Creation(detail),
        (RpcContext::ScanFetch, _) => KuduError::Transmission(detail),
        (_, Some(StatusCode::NotFound)) => KuduError::NotFound(detail),
        (_, Some(StatusCode::IllegalState)) => KuduError::InvalidState(detail),
        (RpcContext::Catalog, Some(code)) if code.is_network() => KuduError::Connection(detail),
        _ => KuduError::Transmission(detail),
    }
}
