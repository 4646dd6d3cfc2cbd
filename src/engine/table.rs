//! Stored table
//!
//! One table of the in-memory engine: a fixed set of tablets, each a sorted
//! map from encoded primary key to a bincode-encoded [`Row`] holding every
//! schema column.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::operation::OperationKind;
use crate::partition::{encode_key, PartitionSchema};
use crate::protocol::{RowOperation, ScanSpec, TableMetadata};
use crate::row::{Cell, PartialRow, Row};
use crate::scanner::ColumnPredicate;
use crate::schema::Schema;
use crate::status::{Status, StatusCode};
use crate::value::Value;

type Tablet = BTreeMap<Vec<u8>, Vec<u8>>;

pub(super) struct StoredTable {
    pub(super) id: String,
    pub(super) name: String,
    pub(super) schema: Arc<Schema>,
    pub(super) partition: PartitionSchema,
    tablets: Vec<RwLock<Tablet>>,
}

impl StoredTable {
    pub(super) fn new(id: String, name: String, schema: Schema, partition: PartitionSchema) -> Self {
        let tablets = (0..partition.num_tablets().max(1))
            .map(|_| RwLock::new(BTreeMap::new()))
            .collect();
        Self {
            id,
            name,
            schema: Arc::new(schema),
            partition,
            tablets,
        }
    }

    pub(super) fn metadata(&self) -> TableMetadata {
        TableMetadata {
            id: self.id.clone(),
            name: self.name.clone(),
            schema: Arc::clone(&self.schema),
            partition: self.partition.clone(),
        }
    }

    pub(super) fn num_tablets(&self) -> usize {
        self.tablets.len()
    }

    pub(super) fn row_count(&self) -> usize {
        self.tablets.iter().map(|t| t.read().len()).sum()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Apply one row operation to the tablet owning its key
    pub(super) fn apply(&self, op: &RowOperation) -> Result<(), Status> {
        let row = &op.row;
        if row.num_columns() != self.schema.num_columns() {
            return Err(Status::invalid_argument(format!(
                "row has {} columns, table {} has {}",
                row.num_columns(),
                self.name,
                self.schema.num_columns()
            )));
        }

        let key_values = (0..self.schema.num_key_columns())
            .map(|idx| row.value(idx))
            .collect::<Option<Vec<&Value>>>()
            .ok_or_else(|| Status::invalid_argument("primary key column not set"))?;
        let key = encode_key(key_values);

        let tablet_idx = self
            .partition
            .tablet_index(&self.schema, |idx| row.value(idx))
            .ok_or_else(|| Status::invalid_argument("row cannot be routed to a tablet"))?;
        let tablet = self
            .tablets
            .get(tablet_idx)
            .ok_or_else(|| Status::invalid_argument(format!("no tablet {}", tablet_idx)))?;

        let mut tablet = tablet.write();
        match op.kind {
            OperationKind::Insert => {
                if tablet.contains_key(&key) {
                    return Err(Status::already_present("key already present"));
                }
                let stored = self.materialize(row)?;
                tablet.insert(key, encode_row(&stored)?);
            }
            OperationKind::Upsert => {
                let stored = match tablet.get(&key) {
                    Some(existing) => self.merge(decode_row(existing)?, row)?,
                    None => self.materialize(row)?,
                };
                tablet.insert(key, encode_row(&stored)?);
            }
            OperationKind::Update => {
                let existing = tablet
                    .get(&key)
                    .ok_or_else(|| Status::not_found("key not found"))?;
                let stored = self.merge(decode_row(existing)?, row)?;
                tablet.insert(key, encode_row(&stored)?);
            }
            OperationKind::Delete => {
                if tablet.remove(&key).is_none() {
                    return Err(Status::not_found("key not found"));
                }
            }
        }
        Ok(())
    }

    /// Full row for a new key: unset columns take their default, else NULL
    fn materialize(&self, row: &PartialRow) -> Result<Row, Status> {
        let cells = self
            .schema
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| match row.cell(idx) {
                Some(Cell::Value(value)) => Some(value.clone()),
                Some(Cell::Null) => None,
                _ => column.default_value().cloned(),
            })
            .collect();
        self.check_not_null(Row::new(cells))
    }

    /// Existing row with the set columns of `row` applied
    fn merge(&self, existing: Row, row: &PartialRow) -> Result<Row, Status> {
        let mut cells = existing.into_cells();
        for idx in row.set_indices() {
            if let Some(cell) = cells.get_mut(idx) {
                *cell = row.value(idx).cloned();
            }
        }
        self.check_not_null(Row::new(cells))
    }

    fn check_not_null(&self, row: Row) -> Result<Row, Status> {
        for (idx, column) in self.schema.columns().iter().enumerate() {
            if !column.is_nullable() && row.is_null(idx) {
                return Err(Status::invalid_argument(format!(
                    "column {} is NOT NULL",
                    column.name()
                )));
            }
        }
        Ok(row)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of matching rows, tablet by tablet in key order
    pub(super) fn scan(&self, spec: &ScanSpec) -> Result<Vec<Row>, Status> {
        if let Some(&bad) = spec.projection.iter().find(|&&idx| idx >= self.schema.num_columns()) {
            return Err(Status::invalid_argument(format!(
                "projected column {} out of range",
                bad
            )));
        }
        let predicates = spec
            .predicates
            .iter()
            .map(|pred| {
                self.schema
                    .find_column(pred.column())
                    .map(|idx| (idx, pred))
                    .ok_or_else(|| {
                        Status::invalid_argument(format!("unknown column {}", pred.column()))
                    })
            })
            .collect::<Result<Vec<(usize, &ColumnPredicate)>, Status>>()?;

        let limit = spec.limit.map_or(usize::MAX, |l| l as usize);
        let mut rows = Vec::new();
        for tablet in &self.tablets {
            let tablet = tablet.read();
            for encoded in tablet.values() {
                if rows.len() >= limit {
                    return Ok(rows);
                }
                let row = decode_row(encoded)?;
                if predicates.iter().all(|(idx, pred)| pred.matches(row.get(*idx))) {
                    let projected = spec
                        .projection
                        .iter()
                        .map(|&idx| row.get(idx).cloned())
                        .collect();
                    rows.push(Row::new(projected));
                }
            }
        }
        Ok(rows)
    }
}

fn encode_row(row: &Row) -> Result<Vec<u8>, Status> {
    bincode::serialize(row)
        .map_err(|e| Status::new(StatusCode::RuntimeError, format!("row encoding failed: {}", e)))
}

fn decode_row(bytes: &[u8]) -> Result<Row, Status> {
    bincode::deserialize(bytes)
        .map_err(|e| Status::new(StatusCode::RuntimeError, format!("corrupt stored row: {}", e)))
}
