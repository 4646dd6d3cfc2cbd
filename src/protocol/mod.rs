//! Protocol Module
//!
//! The request/response boundary between the client and the engine.
//!
//! ## Operations
//! ```text
//! ┌──────────────┬──────────────────────────┬──────────────────────┐
//! │ Request      │ Payload                  │ Response             │
//! ├──────────────┼──────────────────────────┼──────────────────────┤
//! │ TableExists  │ name                     │ Exists(bool)         │
//! │ ListTables   │ -                        │ Tables(names)        │
//! │ CreateTable  │ TableDefinition          │ Ack                  │
//! │ DeleteTable  │ name                     │ Ack                  │
//! │ OpenTable    │ name                     │ Table(TableMetadata) │
//! │ Write        │ table id + operations    │ Write(row errors)    │
//! │ OpenScan     │ ScanSpec                 │ ScanPage             │
//! │ ScanNext     │ scanner id               │ ScanPage             │
//! │ CloseScan    │ scanner id               │ Ack                  │
//! └──────────────┴──────────────────────────┴──────────────────────┘
//! ```
//!
//! Framing and routing belong to the engine side of [`Transport`]. Any call
//! may fail with a [`Status`](crate::status::Status).

mod request;
mod response;
mod transport;

pub use request::{Request, RequestType, RowOperation, ScanSpec, ScannerId, TableDefinition};
pub use response::{Response, ScanPage, TableMetadata};
pub use transport::{Connector, Transport};
