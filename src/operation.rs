//! Write Operations
//!
//! A typed, sparse row mutation bound to one table. Column names and types are
//! checked when a value is set, so mistakes surface at the call that made
//! them. Whole-row rules (key present, required columns set) are checked when
//! the operation is applied to a session.

use std::fmt;

use bytes::Bytes;

use crate::client::Table;
use crate::error::{Result, ValidationError};
use crate::protocol::RowOperation;
use crate::row::PartialRow;
use crate::value::Value;

/// Kinds of row mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Fails if the key already exists
    Insert,
    /// Fails if the key does not exist
    Update,
    /// Inserts or overwrites
    Upsert,
    /// Fails if the key does not exist
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Insert => "INSERT",
            OperationKind::Update => "UPDATE",
            OperationKind::Upsert => "UPSERT",
            OperationKind::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A row mutation against one table
#[derive(Clone)]
pub struct WriteOperation {
    table: Table,
    kind: OperationKind,
    row: PartialRow,
}

impl WriteOperation {
    pub(crate) fn new(table: Table, kind: OperationKind) -> Self {
        let row = PartialRow::new(table.schema().num_columns());
        Self { table, kind, row }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub fn row(&self) -> &PartialRow {
        &self.row
    }

    /// Whether the named column has been set (to a value or NULL)
    pub fn is_set(&self, column: &str) -> bool {
        self.table
            .schema()
            .find_column(column)
            .map(|idx| self.row.is_set(idx))
            .unwrap_or(false)
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Set a column to a value of the column's exact type
    pub fn set_value(&mut self, column: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();
        let idx = self.column_index(column)?;
        let expected = self.table.schema().columns()[idx].data_type();
        if value.data_type() != expected {
            return Err(ValidationError::TypeMismatch {
                column: column.to_string(),
                expected,
                actual: value.data_type(),
            }
            .into());
        }
        self.row.set(idx, Some(value));
        Ok(self)
    }

    /// Set a nullable column to NULL
    pub fn set_null(&mut self, column: &str) -> Result<&mut Self> {
        let idx = self.column_index(column)?;
        if !self.table.schema().columns()[idx].is_nullable() {
            return Err(ValidationError::NullViolation {
                column: column.to_string(),
            }
            .into());
        }
        self.row.set(idx, None);
        Ok(self)
    }

    pub fn set_int8(&mut self, column: &str, value: i8) -> Result<&mut Self> {
        self.set_value(column, Value::Int8(value))
    }

    pub fn set_int16(&mut self, column: &str, value: i16) -> Result<&mut Self> {
        self.set_value(column, Value::Int16(value))
    }

    pub fn set_int32(&mut self, column: &str, value: i32) -> Result<&mut Self> {
        self.set_value(column, Value::Int32(value))
    }

    pub fn set_int64(&mut self, column: &str, value: i64) -> Result<&mut Self> {
        self.set_value(column, Value::Int64(value))
    }

    pub fn set_string(&mut self, column: &str, value: impl Into<String>) -> Result<&mut Self> {
        self.set_value(column, Value::String(value.into()))
    }

    pub fn set_bool(&mut self, column: &str, value: bool) -> Result<&mut Self> {
        self.set_value(column, Value::Bool(value))
    }

    pub fn set_float(&mut self, column: &str, value: f32) -> Result<&mut Self> {
        self.set_value(column, Value::Float(value))
    }

    pub fn set_double(&mut self, column: &str, value: f64) -> Result<&mut Self> {
        self.set_value(column, Value::Double(value))
    }

    pub fn set_binary(&mut self, column: &str, value: impl Into<Bytes>) -> Result<&mut Self> {
        self.set_value(column, Value::Binary(value.into()))
    }

    pub fn set_unixtime_micros(&mut self, column: &str, micros: i64) -> Result<&mut Self> {
        self.set_value(column, Value::UnixtimeMicros(micros))
    }

    // =========================================================================
    // Apply-time validation
    // =========================================================================

    /// Whole-row checks performed when the operation is applied
    pub(crate) fn validate(&self) -> std::result::Result<(), ValidationError> {
        let schema = self.table.schema();

        for (idx, column) in schema.key_columns().iter().enumerate() {
            if self.row.value(idx).is_none() {
                return Err(ValidationError::MissingColumn {
                    column: column.name().to_string(),
                });
            }
        }

        let non_key = schema.num_key_columns()..schema.num_columns();
        match self.kind {
            OperationKind::Insert | OperationKind::Upsert => {
                for idx in non_key {
                    let column = &schema.columns()[idx];
                    if !column.is_nullable()
                        && column.default_value().is_none()
                        && !self.row.is_set(idx)
                    {
                        return Err(ValidationError::MissingColumn {
                            column: column.name().to_string(),
                        });
                    }
                }
            }
            OperationKind::Update => {
                if !non_key.into_iter().any(|idx| self.row.is_set(idx)) {
                    return Err(ValidationError::InvalidOperation(format!(
                        "no fields updated in {}",
                        self
                    )));
                }
            }
            OperationKind::Delete => {
                if let Some(idx) = non_key.into_iter().find(|&idx| self.row.is_set(idx)) {
                    return Err(ValidationError::InvalidOperation(format!(
                        "DELETE must not set non-key column '{}'",
                        schema.columns()[idx].name()
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn to_row_operation(&self) -> RowOperation {
        RowOperation {
            kind: self.kind,
            row: self.row.clone(),
        }
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.table.schema().find_column(column).ok_or_else(|| {
            ValidationError::UnknownColumn {
                column: column.to_string(),
            }
            .into()
        })
    }
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.kind,
            self.table.name(),
            self.row.to_string_with(self.table.schema().columns())
        )
    }
}

impl fmt::Debug for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteOperation")
            .field("table", &self.table.name())
            .field("kind", &self.kind)
            .field("row", &self.row)
            .finish()
    }
}
