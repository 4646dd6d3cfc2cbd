//! # kudu-client
//!
//! Client layer for a distributed tabular store:
//! - Declarative, validated table schemas
//! - Hash and range partitioned table creation
//! - Typed write operations buffered by sessions with three flush modes
//! - Paged scans through server-side cursors, with projection and predicates
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! └──────┬──────────────────┬──────────────────────┬────────────┘
//!        │                  │                      │
//!        ▼                  ▼                      ▼
//!  ┌────────────┐    ┌─────────────┐        ┌─────────────┐
//!  │   Schema   │    │   Session   │        │   Scanner   │
//!  │  Builder   │    │ (+ flusher) │        │ (ScanBatch) │
//!  └─────┬──────┘    └──────┬──────┘        └──────┬──────┘
//!        │                  │                      │
//!        ▼                  ▼                      ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Client (Table, TableCreator)                   │
//! │            status translation → KuduError                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Request / Response / Status
//!                       ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │        Transport (engine::MemoryCluster or external)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use kudu_client::{Client, DataType, FlushMode, MemoryCluster, SchemaBuilder};
//!
//! let client = Client::builder()
//!     .add_master_server_addr("127.0.0.1:7051")
//!     .connector(MemoryCluster::new())
//!     .build()?;
//!
//! let mut builder = SchemaBuilder::new();
//! builder.add_column("c1").data_type(DataType::Int32).not_null().primary_key();
//! let schema = builder.build()?;
//!
//! client
//!     .new_table_creator()
//!     .table_name("test")
//!     .schema(&schema)
//!     .add_hash_partitions(["c1"], 2)
//!     .num_replicas(1)
//!     .create()?;
//!
//! let table = client.open_table("test")?;
//! let mut session = client.new_session();
//! session.set_flush_mode(FlushMode::ManualFlush)?;
//! for i in 0..10 {
//!     let mut insert = table.new_insert();
//!     insert.set_int32("c1", i)?;
//!     session.apply(insert)?;
//! }
//! session.flush()?;
//! session.close()?;
//!
//! let mut scanner = table.new_scanner();
//! scanner.open()?;
//! let mut seen = 0;
//! while scanner.has_more_rows() {
//!     let mut batch = scanner.next_batch()?;
//!     while batch.next() {
//!         seen += 1;
//!     }
//! }
//! assert_eq!(seen, 10);
//! # Ok::<(), kudu_client::KuduError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod status;
pub mod config;

pub mod value;
pub mod schema;
pub mod row;
pub mod partition;
pub mod protocol;
pub mod operation;
pub mod client;
pub mod session;
pub mod scanner;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, FlushError, KuduError, Result, RowError, ValidationError};
pub use status::{Status, StatusCode};
pub use config::{ClientConfig, HostPort};
pub use value::Value;
pub use schema::{ColumnSchema, ColumnSpec, DataType, Schema, SchemaBuilder};
pub use row::Row;
pub use operation::{OperationKind, WriteOperation};
pub use client::{Client, ClientBuilder, Table, TableCreator};
pub use session::{FlushMode, Session};
pub use scanner::{ColumnPredicate, ComparisonOp, ScanBatch, Scanner};
pub use engine::MemoryCluster;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the client library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
