//! Row representations
//!
//! - [`PartialRow`]: sparse row carried by a write operation. Each column is
//!   unset, explicitly NULL, or holds a value.
//! - [`Row`]: dense row returned by a scan, one cell per projected column.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::schema::ColumnSchema;
use crate::value::Value;

/// State of one column in a [`PartialRow`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Unset,
    Null,
    Value(Value),
}

/// Sparse row, indexed by schema column position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialRow {
    cells: Vec<Cell>,
}

impl PartialRow {
    pub fn new(num_columns: usize) -> Self {
        Self {
            cells: vec![Cell::Unset; num_columns],
        }
    }

    pub(crate) fn set(&mut self, idx: usize, value: Option<Value>) {
        self.cells[idx] = match value {
            Some(value) => Cell::Value(value),
            None => Cell::Null,
        };
    }

    pub fn cell(&self, idx: usize) -> Option<&Cell> {
        self.cells.get(idx)
    }

    pub fn is_set(&self, idx: usize) -> bool {
        matches!(self.cells.get(idx), Some(Cell::Null | Cell::Value(_)))
    }

    pub fn is_null(&self, idx: usize) -> bool {
        matches!(self.cells.get(idx), Some(Cell::Null))
    }

    /// The value of a set, non-NULL column
    pub fn value(&self, idx: usize) -> Option<&Value> {
        match self.cells.get(idx) {
            Some(Cell::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Positions of every column that has been set
    pub fn set_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !matches!(cell, Cell::Unset))
            .map(|(idx, _)| idx)
    }

    pub fn num_columns(&self) -> usize {
        self.cells.len()
    }

    /// Render the set columns, e.g. `(int32 c1=1, string name="a")`
    pub fn to_string_with(&self, columns: &[ColumnSchema]) -> String {
        let mut out = String::from("(");
        let mut first = true;
        for idx in self.set_indices() {
            if !first {
                out.push_str(", ");
            }
            first = false;
            let value = self.value(idx);
            write_cell(&mut out, &columns[idx], value);
        }
        out.push(')');
        out
    }
}

/// Dense result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<Option<Value>>,
}

impl Row {
    pub fn new(cells: Vec<Option<Value>>) -> Self {
        Self { cells }
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.cells.get(idx).and_then(Option::as_ref)
    }

    pub fn is_null(&self, idx: usize) -> bool {
        matches!(self.cells.get(idx), Some(None))
    }

    pub fn cells(&self) -> &[Option<Value>] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Option<Value>> {
        self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Render with column names and types, e.g. `(int32 c1=0, string s=NULL)`
    pub fn to_string_with(&self, columns: &[ColumnSchema]) -> String {
        let mut out = String::from("(");
        for (idx, (column, cell)) in columns.iter().zip(&self.cells).enumerate() {
            if idx > 0 {
                out.push_str(", ");
            }
            write_cell(&mut out, column, cell.as_ref());
        }
        out.push(')');
        out
    }
}

fn write_cell(out: &mut String, column: &ColumnSchema, value: Option<&Value>) {
    let _ = write!(out, "{} {}=", column.data_type(), column.name());
    match value {
        Some(value) => {
            let _ = write!(out, "{}", value);
        }
        None => out.push_str("NULL"),
    }
}
