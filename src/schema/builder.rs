//! Schema Builder
//!
//! Declarative construction of a [`Schema`]. Column specs stay mutable until
//! `build()`, which validates everything at once and freezes copies.

use std::collections::HashSet;

use crate::error::{KuduError, Result};
use crate::value::Value;

use super::{ColumnSchema, DataType, Schema};

/// A column under construction
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    name: String,
    data_type: Option<DataType>,
    nullable: bool,
    default: Option<Value>,
    primary_key: bool,
}

impl ColumnSpec {
    fn new(name: String) -> Self {
        Self {
            name,
            data_type: None,
            nullable: true,
            default: None,
            primary_key: false,
        }
    }

    pub fn data_type(&mut self, data_type: DataType) -> &mut Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = false;
        self
    }

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    /// Value used when an insert leaves the column unset
    pub fn default_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    /// Mark this single column as the primary key (implies NOT NULL)
    pub fn primary_key(&mut self) -> &mut Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builds a [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<ColumnSpec>,
    key_names: Option<Vec<String>>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a column and return its spec for configuration
    pub fn add_column(&mut self, name: impl Into<String>) -> &mut ColumnSpec {
        self.columns.push(ColumnSpec::new(name.into()));
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Designate the primary-key columns, in key order
    pub fn set_primary_key<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Validate the declaration and produce an immutable schema.
    ///
    /// The builder is left untouched, so a failed build can be corrected and
    /// retried.
    pub fn build(&self) -> Result<Schema> {
        if self.columns.is_empty() {
            return Err(KuduError::Schema("no columns were specified".to_string()));
        }

        let mut seen = HashSet::new();
        for spec in &self.columns {
            if spec.name.is_empty() {
                return Err(KuduError::Schema("column name must not be empty".to_string()));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(KuduError::Schema(format!(
                    "duplicate column name: {}",
                    spec.name
                )));
            }
        }

        let key_names = self.resolve_key_names()?;
        let mut key_indices = Vec::with_capacity(key_names.len());
        for name in &key_names {
            let idx = self
                .columns
                .iter()
                .position(|spec| &spec.name == name)
                .ok_or_else(|| {
                    KuduError::Schema(format!("primary key column not defined: {}", name))
                })?;
            if key_indices.contains(&idx) {
                return Err(KuduError::Schema(format!(
                    "primary key column listed twice: {}",
                    name
                )));
            }
            key_indices.push(idx);
        }

        let mut columns = Vec::with_capacity(self.columns.len());
        for &idx in &key_indices {
            columns.push(Self::freeze(&self.columns[idx], true)?);
        }
        for (idx, spec) in self.columns.iter().enumerate() {
            if !key_indices.contains(&idx) {
                columns.push(Self::freeze(spec, false)?);
            }
        }

        tracing::debug!(
            columns = columns.len(),
            key_columns = key_indices.len(),
            "schema built"
        );
        Ok(Schema::from_validated(columns, key_indices.len()))
    }

    /// Key names from either `set_primary_key` or per-column `primary_key()`
    fn resolve_key_names(&self) -> Result<Vec<String>> {
        let marked: Vec<String> = self
            .columns
            .iter()
            .filter(|spec| spec.primary_key)
            .map(|spec| spec.name.clone())
            .collect();

        match (&self.key_names, marked.len()) {
            (Some(_), n) if n > 0 => Err(KuduError::Schema(
                "primary key specified both per column and by set_primary_key".to_string(),
            )),
            (Some(names), _) if names.is_empty() => {
                Err(KuduError::Schema("no primary key specified".to_string()))
            }
            (Some(names), _) => Ok(names.clone()),
            (None, 0) => Err(KuduError::Schema("no primary key specified".to_string())),
            (None, 1) => Ok(marked),
            (None, _) => Err(KuduError::Schema(
                "multiple columns marked primary_key(); use set_primary_key for a compound key"
                    .to_string(),
            )),
        }
    }

    fn freeze(spec: &ColumnSpec, is_key: bool) -> Result<ColumnSchema> {
        let data_type = spec.data_type.ok_or_else(|| {
            KuduError::Schema(format!("no type provided for column: {}", spec.name))
        })?;

        if is_key {
            if spec.nullable {
                return Err(KuduError::Schema(format!(
                    "primary key column must be NOT NULL: {}",
                    spec.name
                )));
            }
            if !data_type.is_valid_key_type() {
                return Err(KuduError::Schema(format!(
                    "primary key column {} may not have type {}",
                    spec.name, data_type
                )));
            }
        }

        if let Some(default) = &spec.default {
            if default.data_type() != data_type {
                return Err(KuduError::Schema(format!(
                    "default value for column {} has type {}, expected {}",
                    spec.name,
                    default.data_type(),
                    data_type
                )));
            }
        }

        Ok(ColumnSchema {
            name: spec.name.clone(),
            data_type,
            nullable: spec.nullable,
            default: spec.default.clone(),
            is_key,
        })
    }
}
