//! Open table handle

use std::fmt;
use std::sync::Arc;

use crate::operation::{OperationKind, WriteOperation};
use crate::partition::PartitionSchema;
use crate::protocol::TableMetadata;
use crate::scanner::Scanner;
use crate::schema::Schema;

use super::ClientInner;

/// A table opened through a [`Client`](super::Client).
///
/// Cheap to clone and safe to share between threads; sessions on different
/// threads may write to the same table concurrently.
#[derive(Clone)]
pub struct Table {
    client: Arc<ClientInner>,
    metadata: Arc<TableMetadata>,
}

impl Table {
    pub(crate) fn new(client: Arc<ClientInner>, metadata: TableMetadata) -> Self {
        Self {
            client,
            metadata: Arc::new(metadata),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Engine-assigned identifier
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.metadata.schema
    }

    pub fn partition_schema(&self) -> &PartitionSchema {
        &self.metadata.partition
    }

    pub fn new_insert(&self) -> WriteOperation {
        WriteOperation::new(self.clone(), OperationKind::Insert)
    }

    pub fn new_update(&self) -> WriteOperation {
        WriteOperation::new(self.clone(), OperationKind::Update)
    }

    pub fn new_upsert(&self) -> WriteOperation {
        WriteOperation::new(self.clone(), OperationKind::Upsert)
    }

    pub fn new_delete(&self) -> WriteOperation {
        WriteOperation::new(self.clone(), OperationKind::Delete)
    }

    pub fn new_scanner(&self) -> Scanner {
        Scanner::new(self.clone())
    }

    /// Release this handle. Other clones stay usable.
    pub fn close(self) {
        tracing::trace!(table = %self.metadata.name, "table handle closed");
    }

    pub(crate) fn client(&self) -> &Arc<ClientInner> {
        &self.client
    }

    /// Whether this table was opened through the given connection
    pub(crate) fn belongs_to(&self, client: &Arc<ClientInner>) -> bool {
        Arc::ptr_eq(&self.client, client)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.metadata.name)
            .field("id", &self.metadata.id)
            .finish()
    }
}
