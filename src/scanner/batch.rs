//! Scan Batch
//!
//! One page of scan results. Rows are read through a cursor: call `next()` to
//! move onto the first row, then again for each following row. `next()`
//! returning false means this page is done, not the scan.

use bytes::Bytes;

use crate::error::{KuduError, Result, ValidationError};
use crate::row::Row;
use crate::schema::{ColumnSchema, DataType};
use crate::value::Value;

/// A page of rows, borrowed from its [`Scanner`](super::Scanner) until dropped
#[derive(Debug)]
pub struct ScanBatch<'a> {
    rows: Vec<Row>,
    columns: &'a [ColumnSchema],
    cursor: Option<usize>,
}

impl<'a> ScanBatch<'a> {
    pub(super) fn new(rows: Vec<Row>, columns: &'a [ColumnSchema]) -> Self {
        Self {
            rows,
            columns,
            cursor: None,
        }
    }

    /// Move to the next row of this page
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        let next = self.cursor.map_or(0, |idx| idx + 1);
        if next < self.rows.len() {
            self.cursor = Some(next);
            true
        } else {
            self.cursor = Some(self.rows.len());
            false
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Columns of each row, in projection order
    pub fn projection(&self) -> &[ColumnSchema] {
        self.columns
    }

    /// All rows of the page, independent of the cursor
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// The row under the cursor
    pub fn current_row(&self) -> Result<&Row> {
        self.cursor
            .and_then(|idx| self.rows.get(idx))
            .ok_or_else(|| KuduError::InvalidState("no current row in scan batch".to_string()))
    }

    /// Current row rendered as `(int32 c1=0, string name="a")`
    pub fn row_to_string(&self) -> Result<String> {
        Ok(self.current_row()?.to_string_with(self.columns))
    }

    // =========================================================================
    // Typed accessors (current row)
    // =========================================================================

    /// Cell of the named column; `None` means NULL
    pub fn get_value(&self, column: &str) -> Result<Option<&Value>> {
        let idx = self.column_index(column)?;
        Ok(self.current_row()?.get(idx))
    }

    pub fn is_null(&self, column: &str) -> Result<bool> {
        Ok(self.get_value(column)?.is_none())
    }

    pub fn get_int8(&self, column: &str) -> Result<i8> {
        match self.typed(column, DataType::Int8)? {
            Value::Int8(v) => Ok(*v),
            other => Err(Self::mismatch(column, DataType::Int8, other)),
        }
    }

    pub fn get_int16(&self, column: &str) -> Result<i16> {
        match self.typed(column, DataType::Int16)? {
            Value::Int16(v) => Ok(*v),
            other => Err(Self::mismatch(column, DataType::Int16, other)),
        }
    }

    pub fn get_int32(&self, column: &str) -> Result<i32> {
        match self.typed(column, DataType::Int32)? {
            Value::Int32(v) => Ok(*v),
            other => Err(Self::mismatch(column, DataType::Int32, other)),
        }
    }

    pub fn get_int64(&self, column: &str) -> Result<i64> {
        match self.typed(column, DataType::Int64)? {
            Value::Int64(v) => Ok(*v),
            other => Err(Self::mismatch(column, DataType::Int64, other)),
        }
    }

    pub fn get_string(&self, column: &str) -> Result<&str> {
        match self.typed(column, DataType::String)? {
            Value::String(v) => Ok(v),
            other => Err(Self::mismatch(column, DataType::String, other)),
        }
    }

    pub fn get_bool(&self, column: &str) -> Result<bool> {
        match self.typed(column, DataType::Bool)? {
            Value::Bool(v) => Ok(*v),
            other => Err(Self::mismatch(column, DataType::Bool, other)),
        }
    }

    pub fn get_float(&self, column: &str) -> Result<f32> {
        match self.typed(column, DataType::Float)? {
            Value::Float(v) => Ok(*v),
            other => Err(Self::mismatch(column, DataType::Float, other)),
        }
    }

    pub fn get_double(&self, column: &str) -> Result<f64> {
        match self.typed(column, DataType::Double)? {
            Value::Double(v) => Ok(*v),
            other => Err(Self::mismatch(column, DataType::Double, other)),
        }
    }

    pub fn get_binary(&self, column: &str) -> Result<&Bytes> {
        match self.typed(column, DataType::Binary)? {
            Value::Binary(v) => Ok(v),
            other => Err(Self::mismatch(column, DataType::Binary, other)),
        }
    }

    pub fn get_unixtime_micros(&self, column: &str) -> Result<i64> {
        match self.typed(column, DataType::UnixtimeMicros)? {
            Value::UnixtimeMicros(v) => Ok(*v),
            other => Err(Self::mismatch(column, DataType::UnixtimeMicros, other)),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name() == column)
            .ok_or_else(|| {
                ValidationError::UnknownColumn {
                    column: column.to_string(),
                }
                .into()
            })
    }

    /// Non-NULL cell of a column that must have the requested type
    fn typed(&self, column: &str, requested: DataType) -> Result<&Value> {
        let idx = self.column_index(column)?;
        let declared = self.columns[idx].data_type();
        if declared != requested {
            return Err(ValidationError::TypeMismatch {
                column: column.to_string(),
                expected: declared,
                actual: requested,
            }
            .into());
        }
        self.current_row()?.get(idx).ok_or_else(|| {
            ValidationError::NullValue {
                column: column.to_string(),
            }
            .into()
        })
    }

    fn mismatch(column: &str, requested: DataType, actual: &Value) -> KuduError {
        ValidationError::TypeMismatch {
            column: column.to_string(),
            expected: actual.data_type(),
            actual: requested,
        }
        .into()
    }
}
