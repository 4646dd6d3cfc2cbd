//! Table creation

use std::sync::Arc;

use crate::error::{KuduError, Result};
use crate::partition::PartitionSchema;
use crate::protocol::{Request, TableDefinition};
use crate::schema::Schema;
use crate::status::RpcContext;
use crate::value::Value;

use super::ClientInner;

/// Default replication factor of new tables
pub const DEFAULT_NUM_REPLICAS: u32 = 3;

/// Collects a table definition and submits it.
///
/// ```ignore
/// let mut creator = client.new_table_creator();
/// creator
///     .table_name("metrics")
///     .schema(&schema)
///     .add_hash_partitions(["host"], 4);
/// creator.create()?;
/// ```
pub struct TableCreator {
    client: Arc<ClientInner>,
    name: Option<String>,
    schema: Option<Schema>,
    partition: PartitionSchema,
    num_replicas: u32,
}

impl TableCreator {
    pub(crate) fn new(client: Arc<ClientInner>) -> Self {
        Self {
            client,
            name: None,
            schema: None,
            partition: PartitionSchema::default(),
            num_replicas: DEFAULT_NUM_REPLICAS,
        }
    }

    pub fn table_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn schema(&mut self, schema: &Schema) -> &mut Self {
        self.schema = Some(schema.clone());
        self
    }

    /// Add a hash dimension over `columns` with `num_buckets` buckets
    pub fn add_hash_partitions<I, S>(&mut self, columns: I, num_buckets: u32) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_hash_partitions_with_seed(columns, num_buckets, 0)
    }

    pub fn add_hash_partitions_with_seed<I, S>(
        &mut self,
        columns: I,
        num_buckets: u32,
        seed: u32,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.partition.add_hash_partitions(columns, num_buckets, seed);
        self
    }

    pub fn set_range_partition_columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition.range.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a split point, one value per range partition column
    pub fn add_range_split(&mut self, values: Vec<Value>) -> &mut Self {
        self.partition.range.splits.push(values);
        self
    }

    pub fn num_replicas(&mut self, num_replicas: u32) -> &mut Self {
        self.num_replicas = num_replicas;
        self
    }

    /// Validate the definition and create the table (blocking)
    pub fn create(&self) -> Result<()> {
        let name = self
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| KuduError::Creation("missing table name".to_string()))?;
        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| KuduError::Creation("missing schema".to_string()))?;

        if self.partition.hash.is_empty() && self.partition.range.columns.is_empty() {
            return Err(KuduError::Creation(
                "table partitioning must be specified using hash or range partitions".to_string(),
            ));
        }
        if self.num_replicas == 0 || self.num_replicas % 2 == 0 {
            return Err(KuduError::Creation(format!(
                "illegal replication factor {}: must be odd and positive",
                self.num_replicas
            )));
        }
        self.partition
            .validate(schema)
            .map_err(|reason| KuduError::Creation(format!("invalid partitioning: {}", reason)))?;

        self.client.rpc(
            Request::CreateTable(TableDefinition {
                name: name.to_string(),
                schema: schema.clone(),
                partition: self.partition.clone(),
                num_replicas: self.num_replicas,
            }),
            RpcContext::CreateTable,
        )?;

        tracing::info!(
            table = name,
            tablets = self.partition.num_tablets(),
            "created table"
        );
        Ok(())
    }
}
