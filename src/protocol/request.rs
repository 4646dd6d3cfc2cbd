//! Request definitions
//!
//! Represents calls from the client to the engine.

use std::fmt;

use crate::operation::OperationKind;
use crate::partition::PartitionSchema;
use crate::row::PartialRow;
use crate::scanner::ColumnPredicate;
use crate::schema::Schema;

/// Server-assigned scan cursor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScannerId(pub u64);

impl fmt::Display for ScannerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scanner-{}", self.0)
    }
}

/// Request types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestType {
    TableExists = 0x01,
    ListTables = 0x02,
    CreateTable = 0x03,
    DeleteTable = 0x04,
    OpenTable = 0x05,
    Write = 0x06,
    OpenScan = 0x07,
    ScanNext = 0x08,
    CloseScan = 0x09,
}

/// Everything needed to provision a table
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    pub schema: Schema,
    pub partition: PartitionSchema,
    pub num_replicas: u32,
}

/// One row mutation as sent to the engine
#[derive(Debug, Clone)]
pub struct RowOperation {
    pub kind: OperationKind,
    pub row: PartialRow,
}

/// Scan parameters
#[derive(Debug, Clone)]
pub struct ScanSpec {
    pub table_id: String,
    /// Schema column indices to return, in order
    pub projection: Vec<usize>,
    pub predicates: Vec<ColumnPredicate>,
    pub batch_size_rows: usize,
    pub limit: Option<u64>,
}

/// A parsed request
#[derive(Debug, Clone)]
pub enum Request {
    TableExists { name: String },
    ListTables,
    CreateTable(TableDefinition),
    DeleteTable { name: String },
    OpenTable { name: String },
    /// Operations are applied in order; outcomes are reported per operation
    Write {
        table_id: String,
        operations: Vec<RowOperation>,
    },
    OpenScan(ScanSpec),
    ScanNext { scanner_id: ScannerId },
    CloseScan { scanner_id: ScannerId },
}

impl Request {
    /// Get the request type
    pub fn request_type(&self) -> RequestType {
        match self {
            Request::TableExists { .. } => RequestType::TableExists,
            Request::ListTables => RequestType::ListTables,
            Request::CreateTable(_) => RequestType::CreateTable,
            Request::DeleteTable { .. } => RequestType::DeleteTable,
            Request::OpenTable { .. } => RequestType::OpenTable,
            Request::Write { .. } => RequestType::Write,
            Request::OpenScan(_) => RequestType::OpenScan,
            Request::ScanNext { .. } => RequestType::ScanNext,
            Request::CloseScan { .. } => RequestType::CloseScan,
        }
    }
}
