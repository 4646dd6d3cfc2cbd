//! Tests for Client, ClientBuilder and TableCreator
//!
//! These tests verify:
//! - Master resolution and handshake failures
//! - Table catalog calls (exists, list, open, delete)
//! - Table creation validation and engine-side rejection
//! - Behavior after the client is closed

use kudu_client::protocol::RequestType;
use kudu_client::{
    Client, ClientConfig, DataType, ErrorKind, HostPort, MemoryCluster, Schema, SchemaBuilder,
    Status, StatusCode, Value,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn connect(cluster: &MemoryCluster) -> Client {
    Client::builder()
        .add_master_server_addr("127.0.0.1:7051")
        .connector(cluster.clone())
        .build()
        .unwrap()
}

fn key_schema() -> Schema {
    let mut builder = SchemaBuilder::new();
    builder
        .add_column("c1")
        .data_type(DataType::Int32)
        .not_null()
        .primary_key();
    builder.add_column("payload").data_type(DataType::Binary);
    builder.build().unwrap()
}

fn create_table(client: &Client, name: &str) {
    client
        .new_table_creator()
        .table_name(name)
        .schema(&key_schema())
        .add_hash_partitions(["c1"], 2)
        .num_replicas(1)
        .create()
        .unwrap();
}

// =============================================================================
// Connection Tests
// =============================================================================

#[test]
fn test_connect_first_reachable_master() {
    let cluster = MemoryCluster::with_masters(["master-2:7051"]).unwrap();
    let client = Client::builder()
        .master_server_addrs(["master-1", "master-2"])
        .connector(cluster)
        .build()
        .unwrap();

    assert_eq!(client.master_addr(), &HostPort::new("master-2", 7051));
    assert!(!client.is_closed());
}

#[test]
fn test_no_masters_is_connection_error() {
    let err = Client::builder()
        .connector(MemoryCluster::new())
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[test]
fn test_bad_address_is_connection_error() {
    let err = Client::builder()
        .add_master_server_addr("host:notaport")
        .connector(MemoryCluster::new())
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[test]
fn test_missing_connector_is_connection_error() {
    let err = Client::builder()
        .add_master_server_addr("localhost")
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[test]
fn test_all_handshakes_failing_lists_causes() {
    let cluster = MemoryCluster::with_masters(["elsewhere"]).unwrap();
    let err = Client::builder()
        .master_server_addrs(["a:1", "b:2"])
        .connector(cluster)
        .build()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    let message = err.to_string();
    assert!(message.contains("a:1"), "{}", message);
    assert!(message.contains("b:2"), "{}", message);
}

#[test]
fn test_unavailable_cluster_refuses_handshake() {
    let cluster = MemoryCluster::new();
    cluster.set_available(false);
    let err = Client::builder()
        .add_master_server_addr("localhost")
        .connector(cluster)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[test]
fn test_config_is_carried() {
    let config = ClientConfig::builder()
        .add_master_server_addr("localhost")
        .scan_batch_size_rows(17)
        .build();
    let client = Client::builder()
        .config(config)
        .connector(MemoryCluster::new())
        .build()
        .unwrap();
    assert_eq!(client.config().scan_batch_size_rows, 17);
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[test]
fn test_table_exists_and_list() {
    let cluster = MemoryCluster::new();
    let client = connect(&cluster);
    assert!(!client.table_exists("b").unwrap());

    create_table(&client, "b");
    create_table(&client, "a");

    assert!(client.table_exists("b").unwrap());
    assert_eq!(client.list_tables().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_open_table_exposes_schema() {
    let cluster = MemoryCluster::new();
    let client = connect(&cluster);
    create_table(&client, "test");

    let table = client.open_table("test").unwrap();
    assert_eq!(table.name(), "test");
    assert!(!table.id().is_empty());
    assert_eq!(**table.schema(), key_schema());
    assert_eq!(table.partition_schema().num_tablets(), 2);
    table.close();
}

#[test]
fn test_open_missing_table_not_found() {
    let client = connect(&MemoryCluster::new());
    let err = client.open_table("nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_delete_table() {
    let cluster = MemoryCluster::new();
    let client = connect(&cluster);
    create_table(&client, "doomed");

    client.delete_table("doomed").unwrap();
    assert!(!client.table_exists("doomed").unwrap());
    assert_eq!(
        client.delete_table("doomed").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_catalog_call_on_unavailable_cluster() {
    let cluster = MemoryCluster::new();
    let client = connect(&cluster);
    cluster.set_available(false);

    let err = client.table_exists("test").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

// =============================================================================
// Table Creation Tests
// =============================================================================

#[test]
fn test_create_duplicate_name_fails() {
    let client = connect(&MemoryCluster::new());
    create_table(&client, "test");

    let err = client
        .new_table_creator()
        .table_name("test")
        .schema(&key_schema())
        .add_hash_partitions(["c1"], 2)
        .num_replicas(1)
        .create()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Creation);
}

#[test]
fn test_create_requires_partitioning() {
    let client = connect(&MemoryCluster::new());
    let err = client
        .new_table_creator()
        .table_name("test")
        .schema(&key_schema())
        .num_replicas(1)
        .create()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Creation);
}

#[test]
fn test_create_rejects_bad_partition_columns() {
    let client = connect(&MemoryCluster::new());

    let mut creator = client.new_table_creator();
    creator
        .table_name("test")
        .schema(&key_schema())
        .add_hash_partitions(["payload"], 2)
        .num_replicas(1);
    assert_eq!(creator.create().unwrap_err().kind(), ErrorKind::Creation);

    let mut creator = client.new_table_creator();
    creator
        .table_name("test")
        .schema(&key_schema())
        .add_hash_partitions(["c1"], 1)
        .num_replicas(1);
    assert_eq!(creator.create().unwrap_err().kind(), ErrorKind::Creation);
}

#[test]
fn test_create_rejects_even_replication() {
    let client = connect(&MemoryCluster::new());
    let err = client
        .new_table_creator()
        .table_name("test")
        .schema(&key_schema())
        .add_hash_partitions(["c1"], 2)
        .num_replicas(2)
        .create()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Creation);
}

#[test]
fn test_create_missing_name_or_schema() {
    let client = connect(&MemoryCluster::new());
    let err = client
        .new_table_creator()
        .schema(&key_schema())
        .add_hash_partitions(["c1"], 2)
        .create()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Creation);

    let err = client
        .new_table_creator()
        .table_name("test")
        .add_hash_partitions(["c1"], 2)
        .create()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Creation);
}

#[test]
fn test_create_rejects_too_many_tablets() {
    let cluster = MemoryCluster::new();
    let client = connect(&cluster);
    let err = client
        .new_table_creator()
        .table_name("huge")
        .schema(&key_schema())
        .add_hash_partitions(["c1"], 1 << 30)
        .num_replicas(1)
        .create()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Creation);
    assert!(err.to_string().contains("tablets"), "{}", err);
    assert_eq!(cluster.table_count(), 0);
}

#[test]
fn test_create_with_range_splits() {
    let client = connect(&MemoryCluster::new());
    client
        .new_table_creator()
        .table_name("ranged")
        .schema(&key_schema())
        .add_hash_partitions(["c1"], 2)
        .set_range_partition_columns(["c1"])
        .add_range_split(vec![Value::Int32(100)])
        .add_range_split(vec![Value::Int32(200)])
        .num_replicas(3)
        .create()
        .unwrap();

    let table = client.open_table("ranged").unwrap();
    assert_eq!(table.partition_schema().num_tablets(), 6);
}

#[test]
fn test_create_mistyped_range_split_fails() {
    let client = connect(&MemoryCluster::new());
    let err = client
        .new_table_creator()
        .table_name("ranged")
        .schema(&key_schema())
        .set_range_partition_columns(["c1"])
        .add_range_split(vec![Value::from("100")])
        .num_replicas(1)
        .create()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Creation);
}

#[test]
fn test_engine_rejection_is_creation_error() {
    let cluster = MemoryCluster::new();
    let client = connect(&cluster);
    cluster.inject_failure(
        RequestType::CreateTable,
        Status::new(StatusCode::ServiceUnavailable, "no tablet servers"),
    );

    let err = client
        .new_table_creator()
        .table_name("test")
        .schema(&key_schema())
        .add_hash_partitions(["c1"], 2)
        .num_replicas(1)
        .create()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Creation);
    assert!(err.to_string().contains("no tablet servers"));
    assert!(!client.table_exists("test").unwrap());
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_closed_client_fails_derived_handles() {
    let cluster = MemoryCluster::new();
    let client = connect(&cluster);
    create_table(&client, "test");
    let table = client.open_table("test").unwrap();
    let mut session = client.new_session();
    let mut scanner = table.new_scanner();

    client.close();

    let mut insert = table.new_insert();
    insert.set_int32("c1", 1).unwrap();
    assert_eq!(
        session.apply(insert).unwrap_err().kind(),
        ErrorKind::InvalidState
    );
    assert_eq!(scanner.open().unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(
        table.new_scanner().open().unwrap_err().kind(),
        ErrorKind::InvalidState
    );
}
