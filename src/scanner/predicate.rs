//! Column predicates pushed down to the engine

use std::cmp::Ordering;
use std::fmt;

use crate::error::ValidationError;
use crate::schema::Schema;
use crate::value::Value;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl ComparisonOp {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering == Ordering::Equal,
            ComparisonOp::Less => ordering == Ordering::Less,
            ComparisonOp::LessEqual => ordering != Ordering::Greater,
            ComparisonOp::Greater => ordering == Ordering::Greater,
            ComparisonOp::GreaterEqual => ordering != Ordering::Less,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::Less => "<",
            ComparisonOp::LessEqual => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateKind {
    Comparison { op: ComparisonOp, value: Value },
    IsNull,
    IsNotNull,
    InList(Vec<Value>),
}

/// A filter on one column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPredicate {
    column: String,
    kind: PredicateKind,
}

impl ColumnPredicate {
    pub fn comparison(column: impl Into<String>, op: ComparisonOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            kind: PredicateKind::Comparison {
                op,
                value: value.into(),
            },
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: PredicateKind::IsNull,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: PredicateKind::IsNotNull,
        }
    }

    pub fn in_list<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            column: column.into(),
            kind: PredicateKind::InList(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn kind(&self) -> &PredicateKind {
        &self.kind
    }

    /// Check the column exists and every operand has the column's type
    pub fn validate(&self, schema: &Schema) -> Result<(), ValidationError> {
        let column = schema
            .column_by_name(&self.column)
            .ok_or_else(|| ValidationError::UnknownColumn {
                column: self.column.clone(),
            })?;

        let operands: &[Value] = match &self.kind {
            PredicateKind::Comparison { value, .. } => std::slice::from_ref(value),
            PredicateKind::InList(values) => values,
            PredicateKind::IsNull | PredicateKind::IsNotNull => &[],
        };
        for value in operands {
            if value.data_type() != column.data_type() {
                return Err(ValidationError::TypeMismatch {
                    column: self.column.clone(),
                    expected: column.data_type(),
                    actual: value.data_type(),
                });
            }
        }
        Ok(())
    }

    /// Evaluate against a cell (`None` is NULL). NULL matches only `IsNull`.
    pub fn matches(&self, cell: Option<&Value>) -> bool {
        match (&self.kind, cell) {
            (PredicateKind::IsNull, cell) => cell.is_none(),
            (PredicateKind::IsNotNull, cell) => cell.is_some(),
            (_, None) => false,
            (PredicateKind::Comparison { op, value }, Some(cell)) => cell
                .compare(value)
                .map(|ordering| op.holds(ordering))
                .unwrap_or(false),
            (PredicateKind::InList(values), Some(cell)) => values
                .iter()
                .any(|v| cell.compare(v) == Some(Ordering::Equal)),
        }
    }
}

impl fmt::Display for ColumnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PredicateKind::Comparison { op, value } => {
                write!(f, "{} {} {}", self.column, op.symbol(), value)
            }
            PredicateKind::IsNull => write!(f, "{} IS NULL", self.column),
            PredicateKind::IsNotNull => write!(f, "{} IS NOT NULL", self.column),
            PredicateKind::InList(values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{} IN ({})", self.column, rendered.join(", "))
            }
        }
    }
}
