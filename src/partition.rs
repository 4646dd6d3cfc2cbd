//! Partitioning
//!
//! Describes how rows of a table are distributed across tablets: zero or more
//! hash dimensions (columns + bucket count + seed), followed by an optional
//! range dimension (columns + split rows). The number of tablets is the
//! product of all bucket counts times the number of range partitions.
//!
//! ## Key Encoding
//! Key columns are encoded into an order-preserving byte string:
//! ```text
//! integers   big-endian, sign bit flipped
//! bool       one byte
//! string/bin raw bytes if last, else 0x00 escaped as 0x00 0x01, ended by 0x00 0x00
//! ```

use serde::{Deserialize, Serialize};

use crate::schema::Schema;
use crate::value::Value;

/// Minimum buckets in a hash dimension
pub const MIN_HASH_BUCKETS: u32 = 2;

/// Upper bound on the tablets one table may be created with
pub const MAX_TABLETS: usize = 1024;

/// One level of hash partitioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDimension {
    pub columns: Vec<String>,
    pub num_buckets: u32,
    pub seed: u32,
}

/// Range partitioning over a column subset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeSchema {
    pub columns: Vec<String>,
    /// Split rows; each holds one value per range column
    pub splits: Vec<Vec<Value>>,
}

/// Full partitioning description of a table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartitionSchema {
    pub hash: Vec<HashDimension>,
    pub range: RangeSchema,
}

impl PartitionSchema {
    pub fn add_hash_partitions(&mut self, columns: Vec<String>, num_buckets: u32, seed: u32) {
        self.hash.push(HashDimension {
            columns,
            num_buckets,
            seed,
        });
    }

    /// Number of range partitions (splits + 1)
    pub fn num_range_partitions(&self) -> usize {
        self.range.splits.len() + 1
    }

    /// Total tablets this scheme produces (saturating)
    pub fn num_tablets(&self) -> usize {
        self.checked_num_tablets().unwrap_or(usize::MAX)
    }

    /// Total tablets, or `None` if the product overflows
    pub fn checked_num_tablets(&self) -> Option<usize> {
        self.hash
            .iter()
            .try_fold(self.num_range_partitions(), |total, dimension| {
                total.checked_mul(dimension.num_buckets as usize)
            })
    }

    /// Check the description against a schema. Returns a reason on failure.
    pub fn validate(&self, schema: &Schema) -> std::result::Result<(), String> {
        let mut hashed: Vec<&str> = Vec::new();
        for dimension in &self.hash {
            if dimension.columns.is_empty() {
                return Err("hash partitioning requires at least one column".to_string());
            }
            if dimension.num_buckets < MIN_HASH_BUCKETS {
                return Err(format!(
                    "hash partitioning requires at least {} buckets, got {}",
                    MIN_HASH_BUCKETS, dimension.num_buckets
                ));
            }
            for column in &dimension.columns {
                Self::check_key_column(schema, column)?;
                if hashed.contains(&column.as_str()) {
                    return Err(format!(
                        "column {} appears in more than one hash dimension",
                        column
                    ));
                }
                hashed.push(column);
            }
        }

        for column in &self.range.columns {
            Self::check_key_column(schema, column)?;
        }

        match self.checked_num_tablets() {
            Some(tablets) if tablets <= MAX_TABLETS => {}
            _ => {
                return Err(format!(
                    "partitioning produces more than {} tablets",
                    MAX_TABLETS
                ))
            }
        }

        let mut encoded_splits = Vec::with_capacity(self.range.splits.len());
        for split in &self.range.splits {
            if self.range.columns.is_empty() {
                return Err("range splits given without range partition columns".to_string());
            }
            if split.len() != self.range.columns.len() {
                return Err(format!(
                    "split row has {} values, expected {}",
                    split.len(),
                    self.range.columns.len()
                ));
            }
            for (column, value) in self.range.columns.iter().zip(split) {
                let expected = schema
                    .column_by_name(column)
                    .map(|c| c.data_type())
                    .ok_or_else(|| format!("unknown column {}", column))?;
                if value.data_type() != expected {
                    return Err(format!(
                        "split value for column {} has type {}, expected {}",
                        column,
                        value.data_type(),
                        expected
                    ));
                }
            }
            encoded_splits.push(encode_key(split.iter()));
        }
        encoded_splits.sort();
        if encoded_splits.windows(2).any(|w| w[0] == w[1]) {
            return Err("duplicate range split".to_string());
        }
        Ok(())
    }

    /// Tablet a row belongs to. `cell` yields the value of a schema column by
    /// index; every partition column must be present.
    pub fn tablet_index<'a, F>(&self, schema: &Schema, cell: F) -> Option<usize>
    where
        F: Fn(usize) -> Option<&'a Value>,
    {
        let mut index = 0usize;
        for dimension in &self.hash {
            let values = Self::collect(schema, &dimension.columns, &cell)?;
            let bucket = hash_bucket(&encode_key(values), dimension.seed, dimension.num_buckets);
            index = index * dimension.num_buckets as usize + bucket as usize;
        }

        let range_index = if self.range.splits.is_empty() {
            0
        } else {
            let values = Self::collect(schema, &self.range.columns, &cell)?;
            let key = encode_key(values);
            let mut splits: Vec<Vec<u8>> = self
                .range
                .splits
                .iter()
                .map(|split| encode_key(split.iter()))
                .collect();
            splits.sort();
            splits.partition_point(|split| split.as_slice() <= key.as_slice())
        };

        Some(index * self.num_range_partitions() + range_index)
    }

    fn collect<'a, F>(schema: &Schema, columns: &[String], cell: &F) -> Option<Vec<&'a Value>>
    where
        F: Fn(usize) -> Option<&'a Value>,
    {
        columns
            .iter()
            .map(|name| schema.find_column(name).and_then(cell))
            .collect()
    }

    fn check_key_column(schema: &Schema, column: &str) -> std::result::Result<(), String> {
        match schema.find_column(column) {
            None => Err(format!("unknown partition column {}", column)),
            Some(idx) if !schema.is_key_column(idx) => Err(format!(
                "partition column {} is not a primary key column",
                column
            )),
            Some(_) => Ok(()),
        }
    }
}

/// Order-preserving encoding of a sequence of key values
pub fn encode_key<'a, I>(values: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a Value>,
{
    let values: Vec<&Value> = values.into_iter().collect();
    let mut out = Vec::new();
    let last = values.len().saturating_sub(1);
    for (i, value) in values.into_iter().enumerate() {
        match value {
            Value::Int8(v) => out.push((*v as u8) ^ 0x80),
            Value::Int16(v) => out.extend_from_slice(&((*v as u16) ^ 0x8000).to_be_bytes()),
            Value::Int32(v) => out.extend_from_slice(&((*v as u32) ^ 0x8000_0000).to_be_bytes()),
            Value::Int64(v) | Value::UnixtimeMicros(v) => {
                out.extend_from_slice(&((*v as u64) ^ 0x8000_0000_0000_0000).to_be_bytes())
            }
            Value::Bool(v) => out.push(*v as u8),
            Value::Float(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
            Value::Double(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
            Value::String(s) => encode_bytes(&mut out, s.as_bytes(), i == last),
            Value::Binary(b) => encode_bytes(&mut out, b, i == last),
        }
    }
    out
}

fn encode_bytes(out: &mut Vec<u8>, bytes: &[u8], is_last: bool) {
    if is_last {
        out.extend_from_slice(bytes);
        return;
    }
    for &byte in bytes {
        out.push(byte);
        if byte == 0x00 {
            out.push(0x01);
        }
    }
    out.extend_from_slice(&[0x00, 0x00]);
}

/// Bucket for an encoded key
pub fn hash_bucket(encoded: &[u8], seed: u32, num_buckets: u32) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(seed);
    hasher.update(encoded);
    hasher.finalize() % num_buckets
}
