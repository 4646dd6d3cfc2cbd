//! Scanner Module
//!
//! Reads a table page by page through a server-side cursor.
//!
//! ## Lifecycle
//! ```text
//!   Created ──open──▶ Opened ──last page returned──▶ Exhausted
//!      │                │                                │
//!      └────────────────┴───────────── close ────────────┴──▶ Closed
//! ```
//!
//! Projection, predicates, batch size and limit can only be changed while
//! `Created`. A cursor the engine no longer knows (restart, expiry) surfaces
//! as a `Transmission` error from [`Scanner::next_batch`]; the scan is not
//! resumed.

mod batch;
mod predicate;

pub use batch::ScanBatch;
pub use predicate::{ColumnPredicate, ComparisonOp, PredicateKind};

use std::fmt;

use crate::client::Table;
use crate::error::{KuduError, Result, ValidationError};
use crate::protocol::{Request, ScanPage, ScanSpec, ScannerId};
use crate::row::Row;
use crate::schema::ColumnSchema;
use crate::status::{self, RpcContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Created,
    Opened,
    Exhausted,
    Closed,
}

/// A scan over one table.
///
/// Each batch borrows the scanner, so it has to be dropped before the next
/// one is fetched, and a scanner cannot be driven from two places at once:
///
/// ```compile_fail
/// fn two_batches(scanner: &mut kudu_client::Scanner) {
///     let first = scanner.next_batch().unwrap();
///     let second = scanner.next_batch().unwrap();
///     drop((first, second));
/// }
/// ```
pub struct Scanner {
    table: Table,
    projection: Vec<usize>,
    projected_columns: Vec<ColumnSchema>,
    predicates: Vec<ColumnPredicate>,
    batch_size_rows: usize,
    limit: Option<u64>,
    state: ScannerState,
    scanner_id: Option<ScannerId>,
    /// Page delivered with the open reply, handed out by the first `next_batch`
    first_page: Option<Vec<Row>>,
    server_has_more: bool,
}

impl Scanner {
    pub(crate) fn new(table: Table) -> Self {
        let schema = table.schema();
        let projection = (0..schema.num_columns()).collect();
        let projected_columns = schema.columns().to_vec();
        let batch_size_rows = table.client().config().scan_batch_size_rows.max(1);
        Self {
            table,
            projection,
            projected_columns,
            predicates: Vec::new(),
            batch_size_rows,
            limit: None,
            state: ScannerState::Created,
            scanner_id: None,
            first_page: None,
            server_has_more: false,
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    /// Columns returned for each row
    pub fn projection(&self) -> &[ColumnSchema] {
        &self.projected_columns
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Return only these columns, in this order
    pub fn set_projected_columns<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_configurable()?;
        let schema = self.table.schema();

        let mut projection = Vec::new();
        for name in names {
            let name = name.as_ref();
            let idx = schema
                .find_column(name)
                .ok_or_else(|| ValidationError::UnknownColumn {
                    column: name.to_string(),
                })?;
            projection.push(idx);
        }

        self.projected_columns = projection
            .iter()
            .map(|&idx| schema.columns()[idx].clone())
            .collect();
        self.projection = projection;
        Ok(())
    }

    /// Only return rows matching the predicate. Predicates are ANDed.
    pub fn add_predicate(&mut self, predicate: ColumnPredicate) -> Result<()> {
        self.ensure_configurable()?;
        predicate.validate(self.table.schema())?;
        self.predicates.push(predicate);
        Ok(())
    }

    /// Rows per page requested from the engine (minimum 1)
    pub fn set_batch_size_rows(&mut self, rows: usize) -> Result<()> {
        self.ensure_configurable()?;
        self.batch_size_rows = rows.max(1);
        Ok(())
    }

    /// Stop after this many rows in total
    pub fn set_limit(&mut self, limit: u64) -> Result<()> {
        self.ensure_configurable()?;
        self.limit = Some(limit);
        Ok(())
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Open the server-side cursor
    pub fn open(&mut self) -> Result<()> {
        match self.state {
            ScannerState::Created => {}
            ScannerState::Closed => {
                return Err(KuduError::InvalidState("the scanner is closed".to_string()))
            }
            _ => {
                return Err(KuduError::InvalidState(
                    "the scanner is already open".to_string(),
                ))
            }
        }

        let spec = ScanSpec {
            table_id: self.table.id().to_string(),
            projection: self.projection.clone(),
            predicates: self.predicates.clone(),
            batch_size_rows: self.batch_size_rows,
            limit: self.limit,
        };
        let page = self
            .table
            .client()
            .rpc(Request::OpenScan(spec), RpcContext::ScanOpen)?
            .into_scan_page()
            .map_err(|status| status::translate(status, RpcContext::ScanOpen))?;

        tracing::debug!(
            table = %self.table.name(),
            rows = page.rows.len(),
            has_more = page.has_more,
            "scanner opened"
        );
        self.state = ScannerState::Opened;
        self.accept(page);
        Ok(())
    }

    /// Whether another [`next_batch`](Self::next_batch) call may return rows
    pub fn has_more_rows(&self) -> bool {
        self.state == ScannerState::Opened && (self.first_page.is_some() || self.server_has_more)
    }

    /// Fetch the next page. After the last page, returns empty batches.
    pub fn next_batch(&mut self) -> Result<ScanBatch<'_>> {
        let rows = match self.state {
            ScannerState::Created => {
                return Err(KuduError::InvalidState(
                    "the scanner has not been opened".to_string(),
                ))
            }
            ScannerState::Closed => {
                return Err(KuduError::InvalidState("the scanner is closed".to_string()))
            }
            ScannerState::Exhausted => Vec::new(),
            ScannerState::Opened => match self.first_page.take() {
                Some(rows) => rows,
                None => self.fetch()?,
            },
        };

        if self.state == ScannerState::Opened && !self.has_more_rows() {
            self.state = ScannerState::Exhausted;
            tracing::debug!(table = %self.table.name(), "scan exhausted");
        }
        Ok(ScanBatch::new(rows, &self.projected_columns))
    }

    /// Release the server-side cursor. Closing twice does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.state == ScannerState::Closed {
            return Ok(());
        }
        self.state = ScannerState::Closed;
        self.first_page = None;
        self.server_has_more = false;

        match self.scanner_id.take() {
            Some(scanner_id) => {
                self.table
                    .client()
                    .rpc(Request::CloseScan { scanner_id }, RpcContext::ScanFetch)?;
                tracing::debug!(%scanner_id, "scanner closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn ensure_configurable(&self) -> Result<()> {
        if self.state != ScannerState::Created {
            return Err(KuduError::InvalidState(
                "scanner options cannot change after open".to_string(),
            ));
        }
        Ok(())
    }

    fn fetch(&mut self) -> Result<Vec<Row>> {
        let Some(scanner_id) = self.scanner_id.filter(|_| self.server_has_more) else {
            self.server_has_more = false;
            return Ok(Vec::new());
        };

        let page = self
            .table
            .client()
            .rpc(Request::ScanNext { scanner_id }, RpcContext::ScanFetch)?
            .into_scan_page()
            .map_err(|status| status::translate(status, RpcContext::ScanFetch))?;
        self.accept(page);
        Ok(self.first_page.take().unwrap_or_default())
    }

    /// Record cursor state from a page; its rows are parked in `first_page`
    fn accept(&mut self, page: ScanPage) {
        self.scanner_id = if page.has_more { page.scanner_id } else { None };
        self.server_has_more = page.has_more && self.scanner_id.is_some();
        self.first_page = Some(page.rows);
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("failed to release scanner for table {}: {}", self.table.name(), e);
        }
    }
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("table", &self.table.name())
            .field("state", &self.state)
            .field("scanner_id", &self.scanner_id)
            .field("batch_size_rows", &self.batch_size_rows)
            .field("limit", &self.limit)
            .finish()
    }
}
