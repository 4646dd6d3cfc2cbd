//! Engine Module
//!
//! An in-process engine behind the [`Transport`] boundary. It keeps tables in
//! memory, applies write batches with per-row outcomes and serves paged scans
//! through server-side cursors. Nothing is persisted or replicated.
//!
//! ## Concurrency
//! - Catalog (tables by name and id): `RwLock`, written only by
//!   create/delete.
//! - Each tablet: its own `RwLock`, so writes to different tablets never
//!   contend.
//! - Scan cursors: one `Mutex`.
//!
//! ## Test hooks
//! [`MemoryCluster::restart`] forgets every scan cursor,
//! [`MemoryCluster::set_available`] makes every call fail and
//! [`MemoryCluster::inject_failure`] fails the next request of one type.

mod cursor;
mod table;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::HostPort;
use crate::error::Result;
use crate::protocol::{
    Connector, Request, RequestType, Response, RowOperation, ScanPage, ScanSpec, TableDefinition,
    Transport,
};
use crate::status::{Status, StatusCode};

use cursor::CursorRegistry;
use table::StoredTable;

#[derive(Default)]
struct Catalog {
    by_name: HashMap<String, Arc<StoredTable>>,
    by_id: HashMap<String, Arc<StoredTable>>,
}

struct ClusterState {
    /// Masters accepting handshakes; empty accepts any address
    masters: Vec<HostPort>,
    catalog: RwLock<Catalog>,
    cursors: Mutex<CursorRegistry>,
    injected: Mutex<Vec<(RequestType, Status)>>,
    available: AtomicBool,
    next_table_id: AtomicU64,
}

/// In-memory cluster implementing both [`Connector`] and [`Transport`].
///
/// Clones share the same state.
///
/// ```
/// use kudu_client::{Client, MemoryCluster};
///
/// let client = Client::builder()
///     .add_master_server_addr("127.0.0.1")
///     .connector(MemoryCluster::new())
///     .build()
///     .unwrap();
/// assert!(client.list_tables().unwrap().is_empty());
/// ```
#[derive(Clone)]
pub struct MemoryCluster {
    state: Arc<ClusterState>,
}

impl MemoryCluster {
    /// A cluster that accepts a handshake on any master address
    pub fn new() -> Self {
        Self::with_state(Vec::new())
    }

    /// A cluster whose masters listen only on the given addresses
    pub fn with_masters<I, S>(addrs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let masters = addrs
            .into_iter()
            .map(|addr| HostPort::parse(addr.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_state(masters))
    }

    fn with_state(masters: Vec<HostPort>) -> Self {
        Self {
            state: Arc::new(ClusterState {
                masters,
                catalog: RwLock::new(Catalog::default()),
                cursors: Mutex::new(CursorRegistry::default()),
                injected: Mutex::new(Vec::new()),
                available: AtomicBool::new(true),
                next_table_id: AtomicU64::new(1),
            }),
        }
    }

    // =========================================================================
    // Test hooks
    // =========================================================================

    /// Simulate a tablet server restart: table data survives, scan cursors
    /// do not
    pub fn restart(&self) {
        let dropped = self.state.cursors.lock().clear();
        tracing::info!(cursors = dropped, "memory cluster restarted");
    }

    /// While unavailable, handshakes and calls fail with a network status
    pub fn set_available(&self, available: bool) {
        self.state.available.store(available, Ordering::Release);
    }

    /// Fail the next request of the given type with `status`
    pub fn inject_failure(&self, request_type: RequestType, status: Status) {
        self.state.injected.lock().push((request_type, status));
    }

    pub fn open_scanner_count(&self) -> usize {
        self.state.cursors.lock().len()
    }

    pub fn table_count(&self) -> usize {
        self.state.catalog.read().by_name.len()
    }

    /// Rows stored in a table, or `None` if it does not exist
    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.state
            .catalog
            .read()
            .by_name
            .get(table)
            .map(|t| t.row_count())
    }

    // =========================================================================
    // Request routing
    // =========================================================================

    /// Execute a request
    fn execute(&self, request: Request) -> std::result::Result<Response, Status> {
        match request {
            Request::TableExists { name } => Ok(Response::Exists(
                self.state.catalog.read().by_name.contains_key(&name),
            )),
            Request::ListTables => Ok(Response::Tables(
                self.state.catalog.read().by_name.keys().cloned().collect(),
            )),
            Request::CreateTable(definition) => {
                self.create_table(definition)?;
                Ok(Response::Ack)
            }
            Request::DeleteTable { name } => {
                self.delete_table(&name)?;
                Ok(Response::Ack)
            }
            Request::OpenTable { name } => {
                let catalog = self.state.catalog.read();
                let table = catalog
                    .by_name
                    .get(&name)
                    .ok_or_else(|| Status::not_found(format!("table {} not found", name)))?;
                Ok(Response::Table(table.metadata()))
            }
            Request::Write {
                table_id,
                operations,
            } => Ok(Response::Write {
                row_errors: self.write(&table_id, &operations)?,
            }),
            Request::OpenScan(spec) => self.open_scan(&spec).map(Response::ScanPage),
            Request::ScanNext { scanner_id } => self
                .state
                .cursors
                .lock()
                .next(scanner_id)
                .map(Response::ScanPage),
            Request::CloseScan { scanner_id } => {
                self.state.cursors.lock().close(scanner_id)?;
                Ok(Response::Ack)
            }
        }
    }

    fn create_table(&self, definition: TableDefinition) -> std::result::Result<(), Status> {
        definition
            .partition
            .validate(&definition.schema)
            .map_err(Status::invalid_argument)?;

        let mut catalog = self.state.catalog.write();
        if catalog.by_name.contains_key(&definition.name) {
            return Err(Status::already_present(format!(
                "table {} already exists",
                definition.name
            )));
        }

        let id = format!(
            "{:032x}",
            self.state.next_table_id.fetch_add(1, Ordering::Relaxed)
        );
        let table = Arc::new(StoredTable::new(
            id.clone(),
            definition.name.clone(),
            definition.schema,
            definition.partition,
        ));
        tracing::debug!(
            table = %definition.name,
            %id,
            tablets = table.num_tablets(),
            replicas = definition.num_replicas,
            "table created"
        );
        catalog.by_id.insert(id, Arc::clone(&table));
        catalog.by_name.insert(definition.name, table);
        Ok(())
    }

    fn delete_table(&self, name: &str) -> std::result::Result<(), Status> {
        let mut catalog = self.state.catalog.write();
        let table = catalog
            .by_name
            .remove(name)
            .ok_or_else(|| Status::not_found(format!("table {} not found", name)))?;
        catalog.by_id.remove(&table.id);
        tracing::debug!(table = name, "table deleted");
        Ok(())
    }

    fn lookup(&self, table_id: &str) -> std::result::Result<Arc<StoredTable>, Status> {
        self.state
            .catalog
            .read()
            .by_id
            .get(table_id)
            .cloned()
            .ok_or_else(|| Status::not_found(format!("table id {} not found", table_id)))
    }

    /// Apply operations in order; returns the failed ones by position
    fn write(
        &self,
        table_id: &str,
        operations: &[RowOperation],
    ) -> std::result::Result<Vec<(usize, Status)>, Status> {
        let table = self.lookup(table_id)?;
        let row_errors: Vec<(usize, Status)> = operations
            .iter()
            .enumerate()
            .filter_map(|(idx, op)| table.apply(op).err().map(|status| (idx, status)))
            .collect();
        tracing::trace!(
            table = %table.name,
            operations = operations.len(),
            failed = row_errors.len(),
            "write batch applied"
        );
        Ok(row_errors)
    }

    fn open_scan(&self, spec: &ScanSpec) -> std::result::Result<ScanPage, Status> {
        let table = self.lookup(&spec.table_id)?;
        let rows = table.scan(spec)?;
        tracing::trace!(table = %table.name, rows = rows.len(), "scan snapshot taken");
        Ok(self.state.cursors.lock().open(rows, spec.batch_size_rows))
    }

    fn check_available(&self) -> std::result::Result<(), Status> {
        if self.state.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Status::new(
                StatusCode::ServiceUnavailable,
                "cluster is unavailable",
            ))
        }
    }

    fn take_injected(&self, request_type: RequestType) -> Option<Status> {
        let mut injected = self.state.injected.lock();
        let pos = injected.iter().position(|(t, _)| *t == request_type)?;
        Some(injected.remove(pos).1)
    }
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryCluster {
    fn call(&self, request: Request) -> std::result::Result<Response, Status> {
        self.check_available()?;
        if let Some(status) = self.take_injected(request.request_type()) {
            tracing::debug!(%status, "injected failure");
            return Err(status);
        }
        self.execute(request)
    }
}

impl Connector for MemoryCluster {
    fn connect(&self, master: &HostPort) -> std::result::Result<Arc<dyn Transport>, Status> {
        if !self.state.available.load(Ordering::Acquire) {
            return Err(Status::network_error(format!(
                "{}: connection refused",
                master
            )));
        }
        if !self.state.masters.is_empty() && !self.state.masters.contains(master) {
            return Err(Status::network_error(format!("{}: no master listening", master)));
        }
        Ok(Arc::new(self.clone()))
    }
}
