//! Schema Module
//!
//! Table schemas: logical types, frozen column definitions and the validated,
//! immutable [`Schema`] shared by tables, write operations and scanners.
//!
//! ## Column Layout
//! ```text
//! ┌──────────────────────────┬──────────────────────────────┐
//! │ Key columns (key order)  │ Value columns (declared order)│
//! └──────────────────────────┴──────────────────────────────┘
//!   0 .. num_key_columns        num_key_columns .. num_columns
//! ```
//!
//! A schema is only produced by [`SchemaBuilder::build`], which enforces the
//! invariants; there is no way to mutate one afterwards.

mod builder;

pub use builder::{ColumnSpec, SchemaBuilder};

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

// =============================================================================
// Data Types
// =============================================================================

/// Logical column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    Int8 = 0,
    Int16 = 1,
    Int32 = 2,
    Int64 = 3,
    String = 4,
    Bool = 5,
    Float = 6,
    Double = 7,
    Binary = 8,
    UnixtimeMicros = 9,
}

impl DataType {
    /// Type from its numeric code
    pub fn from_code(code: u8) -> Option<Self> {
        let data_type = match code {
            0 => DataType::Int8,
            1 => DataType::Int16,
            2 => DataType::Int32,
            3 => DataType::Int64,
            4 => DataType::String,
            5 => DataType::Bool,
            6 => DataType::Float,
            7 => DataType::Double,
            8 => DataType::Binary,
            9 => DataType::UnixtimeMicros,
            _ => return None,
        };
        Some(data_type)
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::String => "string",
            DataType::Bool => "bool",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Binary => "binary",
            DataType::UnixtimeMicros => "unixtime_micros",
        }
    }

    /// Whether the type may be part of a primary key
    pub fn is_valid_key_type(&self) -> bool {
        !matches!(self, DataType::Bool | DataType::Float | DataType::Double)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Column Schema
// =============================================================================

/// A column as frozen inside a built [`Schema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    name: String,
    data_type: DataType,
    nullable: bool,
    default: Option<Value>,
    is_key: bool,
}

impl ColumnSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_key(&self) -> bool {
        self.is_key
    }
}

impl fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type.name().to_uppercase())?;
        if !self.nullable {
            f.write_str(" NOT NULL")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {}", default)?;
        }
        Ok(())
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Validated, immutable table schema
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnSchema>,
    num_key_columns: usize,
    name_to_index: HashMap<String, usize>,
}

impl Schema {
    /// Assemble a schema from already-validated, key-first columns
    pub(crate) fn from_validated(columns: Vec<ColumnSchema>, num_key_columns: usize) -> Self {
        let name_to_index = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| (col.name.clone(), idx))
            .collect();
        Self {
            columns,
            num_key_columns,
            name_to_index,
        }
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, idx: usize) -> Option<&ColumnSchema> {
        self.columns.get(idx)
    }

    /// Index of the named column
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ColumnSchema> {
        self.find_column(name).map(|idx| &self.columns[idx])
    }

    pub fn num_key_columns(&self) -> usize {
        self.num_key_columns
    }

    /// Key columns, in key order
    pub fn key_columns(&self) -> &[ColumnSchema] {
        &self.columns[..self.num_key_columns]
    }

    pub fn is_key_column(&self, idx: usize) -> bool {
        idx < self.num_key_columns
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.num_key_columns == other.num_key_columns
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "(")?;
        for column in &self.columns {
            writeln!(f, "    {},", column)?;
        }
        let keys: Vec<&str> = self.key_columns().iter().map(|c| c.name()).collect();
        writeln!(f, "    PRIMARY KEY ({})", keys.join(", "))?;
        write!(f, ")")
    }
}
