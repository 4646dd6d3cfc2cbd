//! Response definitions
//!
//! Represents successful replies from the engine. Failures travel as a
//! `Status` instead.

use std::sync::Arc;

use crate::partition::PartitionSchema;
use crate::row::Row;
use crate::schema::Schema;
use crate::status::Status;

use super::{RequestType, ScannerId};

/// Table description returned by OpenTable
#[derive(Debug, Clone)]
pub struct TableMetadata {
    pub id: String,
    pub name: String,
    pub schema: Arc<Schema>,
    pub partition: PartitionSchema,
}

/// One page of a scan
#[derive(Debug, Clone)]
pub struct ScanPage {
    /// Cursor to continue from; `None` once the server has closed it
    pub scanner_id: Option<ScannerId>,
    pub rows: Vec<Row>,
    pub has_more: bool,
}

/// A response to a request
#[derive(Debug, Clone)]
pub enum Response {
    Exists(bool),
    Tables(Vec<String>),
    Ack,
    Table(TableMetadata),
    /// Failed operations by position within the request; all others succeeded
    Write { row_errors: Vec<(usize, Status)> },
    ScanPage(ScanPage),
}

impl Response {
    /// Whether this response is a valid reply to the given request type
    pub fn answers(&self, request: RequestType) -> bool {
        matches!(
            (request, self),
            (RequestType::TableExists, Response::Exists(_))
                | (RequestType::ListTables, Response::Tables(_))
                | (RequestType::CreateTable, Response::Ack)
                | (RequestType::DeleteTable, Response::Ack)
                | (RequestType::OpenTable, Response::Table(_))
                | (RequestType::Write, Response::Write { .. })
                | (RequestType::OpenScan, Response::ScanPage(_))
                | (RequestType::ScanNext, Response::ScanPage(_))
                | (RequestType::CloseScan, Response::Ack)
        )
    }

    pub fn into_exists(self) -> Result<bool, Status> {
        match self {
            Response::Exists(exists) => Ok(exists),
            other => Err(other.unexpected("Exists")),
        }
    }

    pub fn into_tables(self) -> Result<Vec<String>, Status> {
        match self {
            Response::Tables(names) => Ok(names),
            other => Err(other.unexpected("Tables")),
        }
    }

    pub fn into_table(self) -> Result<TableMetadata, Status> {
        match self {
            Response::Table(metadata) => Ok(metadata),
            other => Err(other.unexpected("Table")),
        }
    }

    /// Per-row failures of a write
    pub fn into_row_errors(self) -> Result<Vec<(usize, Status)>, Status> {
        match self {
            Response::Write { row_errors } => Ok(row_errors),
            other => Err(other.unexpected("Write")),
        }
    }

    pub fn into_scan_page(self) -> Result<ScanPage, Status> {
        match self {
            Response::ScanPage(page) => Ok(page),
            other => Err(other.unexpected("ScanPage")),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Response::Exists(_) => "Exists",
            Response::Tables(_) => "Tables",
            Response::Ack => "Ack",
            Response::Table(_) => "Table",
            Response::Write { .. } => "Write",
            Response::ScanPage(_) => "ScanPage",
        }
    }

    fn unexpected(&self, expected: &str) -> Status {
        Status::message_only(format!(
            "expected a {} response, got {}",
            expected,
            self.name()
        ))
    }
}
