//! Error types for the client
//!
//! Every fallible operation returns a [`KuduError`]. Engine-reported failures
//! are converted in exactly one place (see [`crate::status::translate`]);
//! everything else is raised locally by the component that detects it.

use std::fmt;

use thiserror::Error;

use crate::operation::WriteOperation;
use crate::schema::DataType;
use crate::status::Status;

/// Result type alias using KuduError
pub type Result<T> = std::result::Result<T, KuduError>;

/// Unified error type for client operations
#[derive(Debug, Error)]
pub enum KuduError {
    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    // -------------------------------------------------------------------------
    // Definition Errors
    // -------------------------------------------------------------------------
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Table creation failed: {0}")]
    Creation(String),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Not found: {0}")]
    NotFound(String),

    // -------------------------------------------------------------------------
    // Write Errors
    // -------------------------------------------------------------------------
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transmission error: {0}")]
    Transmission(String),

    #[error(transparent)]
    Flush(#[from] FlushError),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Closed classification of [`KuduError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Schema,
    Creation,
    NotFound,
    Validation,
    Transmission,
    InvalidState,
}

impl KuduError {
    /// The kind of this error. A composite flush failure is a transmission
    /// failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KuduError::Connection(_) => ErrorKind::Connection,
            KuduError::Schema(_) => ErrorKind::Schema,
            KuduError::Creation(_) => ErrorKind::Creation,
            KuduError::NotFound(_) => ErrorKind::NotFound,
            KuduError::Validation(_) => ErrorKind::Validation,
            KuduError::Transmission(_) | KuduError::Flush(_) => ErrorKind::Transmission,
            KuduError::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    /// Per-operation failures when this is a composite flush error
    pub fn row_errors(&self) -> &[RowError] {
        match self {
            KuduError::Flush(flush) => flush.failures(),
            _ => &[],
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Schema => "schema",
            ErrorKind::Creation => "creation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Transmission => "transmission",
            ErrorKind::InvalidState => "invalid_state",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A write operation or scan configuration that violates the table schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("column '{column}' has type {expected}, not {actual}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("column '{column}' is NOT NULL")]
    NullViolation { column: String },

    #[error("column '{column}' is not set")]
    MissingColumn { column: String },

    #[error("column '{column}' is NULL")]
    NullValue { column: String },

    #[error("{0}")]
    InvalidOperation(String),
}

// =============================================================================
// Flush Errors
// =============================================================================

/// A write operation the engine rejected, together with the reason
#[derive(Debug, Clone)]
pub struct RowError {
    operation: WriteOperation,
    status: Status,
}

impl RowError {
    pub(crate) fn new(operation: WriteOperation, status: Status) -> Self {
        Self { operation, status }
    }

    /// The operation that failed
    pub fn failed_op(&self) -> &WriteOperation {
        &self.operation
    }

    /// The engine's reason for rejecting it
    pub fn status(&self) -> &Status {
        &self.status
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.status)
    }
}

/// Aggregated outcome of a flush in which at least one operation failed.
///
/// Successful operations in the same flush are applied; only the failures are
/// carried here, along with how many operations succeeded.
#[derive(Debug, Clone)]
pub struct FlushError {
    failures: Vec<RowError>,
    succeeded: usize,
}

impl FlushError {
    pub(crate) fn new(failures: Vec<RowError>, succeeded: usize) -> Self {
        Self { failures, succeeded }
    }

    pub fn failures(&self) -> &[RowError] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<RowError> {
        self.failures
    }

    /// Number of operations acknowledged successfully in the same flush
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }
}

impl fmt::Display for FlushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} write operations failed",
            self.failures.len(),
            self.failures.len() + self.succeeded
        )?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for FlushError {}
