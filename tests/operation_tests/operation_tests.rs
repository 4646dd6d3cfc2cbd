//! Tests for WriteOperation
//!
//! These tests verify:
//! - Typed setters check column names, types and nullability
//! - Row rendering
//! - Whole-row rules enforced when an operation is applied

use kudu_client::{
    Client, DataType, ErrorKind, FlushMode, KuduError, MemoryCluster, OperationKind,
    SchemaBuilder, Table, ValidationError, Value,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// Table `ops` with key `id`, NOT NULL `name`, nullable `score`, and `state`
/// defaulting to "new"
fn setup_table() -> (Client, Table) {
    let client = Client::builder()
        .add_master_server_addr("127.0.0.1")
        .connector(MemoryCluster::new())
        .build()
        .unwrap();

    let mut builder = SchemaBuilder::new();
    builder
        .add_column("id")
        .data_type(DataType::Int64)
        .not_null()
        .primary_key();
    builder.add_column("name").data_type(DataType::String).not_null();
    builder.add_column("score").data_type(DataType::Double);
    builder
        .add_column("state")
        .data_type(DataType::String)
        .not_null()
        .default_value("new");
    let schema = builder.build().unwrap();

    client
        .new_table_creator()
        .table_name("ops")
        .schema(&schema)
        .add_hash_partitions(["id"], 2)
        .num_replicas(1)
        .create()
        .unwrap();
    let table = client.open_table("ops").unwrap();
    (client, table)
}

fn validation_error(err: KuduError) -> ValidationError {
    match err {
        KuduError::Validation(inner) => inner,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

// =============================================================================
// Setter Tests
// =============================================================================

#[test]
fn test_typed_setters_record_values() {
    let (_client, table) = setup_table();
    let mut insert = table.new_insert();
    insert
        .set_int64("id", 7)
        .unwrap()
        .set_string("name", "seven")
        .unwrap()
        .set_double("score", 0.5)
        .unwrap();

    assert_eq!(insert.kind(), OperationKind::Insert);
    assert_eq!(insert.table_name(), "ops");
    assert!(insert.is_set("id"));
    assert!(insert.is_set("score"));
    assert!(!insert.is_set("state"));
    assert_eq!(insert.row().value(0), Some(&Value::Int64(7)));
}

#[test]
fn test_unknown_column_rejected() {
    let (_client, table) = setup_table();
    let mut insert = table.new_insert();

    let err = insert.set_int64("nope", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        validation_error(err),
        ValidationError::UnknownColumn {
            column: "nope".to_string()
        }
    );
}

#[test]
fn test_type_mismatch_rejected() {
    let (_client, table) = setup_table();
    let mut insert = table.new_insert();

    let err = insert.set_int32("id", 1).unwrap_err();
    assert_eq!(
        validation_error(err),
        ValidationError::TypeMismatch {
            column: "id".to_string(),
            expected: DataType::Int64,
            actual: DataType::Int32,
        }
    );
    assert!(!insert.is_set("id"));
}

#[test]
fn test_set_null_on_not_null_column_rejected() {
    let (_client, table) = setup_table();
    let mut insert = table.new_insert();

    let err = insert.set_null("name").unwrap_err();
    assert!(matches!(
        validation_error(err),
        ValidationError::NullViolation { .. }
    ));

    insert.set_null("score").unwrap();
    assert!(insert.is_set("score"));
    assert!(insert.row().is_null(2));
}

#[test]
fn test_operation_display() {
    let (_client, table) = setup_table();
    let mut delete = table.new_delete();
    delete.set_int64("id", 3).unwrap();

    assert_eq!(delete.to_string(), "DELETE ops (int64 id=3)");
}

// =============================================================================
// Apply-time Validation Tests
// =============================================================================

#[test]
fn test_missing_key_rejected_on_apply() {
    let (client, table) = setup_table();
    let mut session = client.new_session();
    session.set_flush_mode(FlushMode::ManualFlush).unwrap();

    let mut insert = table.new_insert();
    insert.set_string("name", "anonymous").unwrap();
    let err = session.apply(insert).unwrap_err();

    assert!(matches!(
        validation_error(err),
        ValidationError::MissingColumn { column } if column == "id"
    ));
    assert_eq!(session.count_buffered_operations(), 0);
}

#[test]
fn test_insert_requires_not_null_columns_without_default() {
    let (client, table) = setup_table();
    let mut session = client.new_session();
    session.set_flush_mode(FlushMode::ManualFlush).unwrap();

    let mut insert = table.new_insert();
    insert.set_int64("id", 1).unwrap();
    let err = session.apply(insert).unwrap_err();
    assert!(matches!(
        validation_error(err),
        ValidationError::MissingColumn { column } if column == "name"
    ));

    // `state` has a default, `score` is nullable
    let mut insert = table.new_insert();
    insert.set_int64("id", 1).unwrap().set_string("name", "a").unwrap();
    session.apply(insert).unwrap();
    assert_eq!(session.count_buffered_operations(), 1);
}

#[test]
fn test_update_requires_non_key_column() {
    let (client, table) = setup_table();
    let mut session = client.new_session();
    session.set_flush_mode(FlushMode::ManualFlush).unwrap();

    let mut update = table.new_update();
    update.set_int64("id", 1).unwrap();
    let err = session.apply(update).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_delete_rejects_non_key_columns() {
    let (client, table) = setup_table();
    let mut session = client.new_session();
    session.set_flush_mode(FlushMode::ManualFlush).unwrap();

    let mut delete = table.new_delete();
    delete.set_int64("id", 1).unwrap().set_double("score", 1.0).unwrap();
    let err = session.apply(delete).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_operation_from_other_client_rejected() {
    let (client, _table) = setup_table();
    let (_other_client, other_table) = setup_table();
    let mut session = client.new_session();

    let mut insert = other_table.new_insert();
    insert.set_int64("id", 1).unwrap().set_string("name", "x").unwrap();
    let err = session.apply(insert).unwrap_err();
    assert!(matches!(
        validation_error(err),
        ValidationError::InvalidOperation(_)
    ));
}

#[test]
fn test_default_applied_by_engine() {
    let (client, table) = setup_table();
    let mut session = client.new_session();

    let mut insert = table.new_insert();
    insert.set_int64("id", 5).unwrap().set_string("name", "five").unwrap();
    session.apply(insert).unwrap();
    session.close().unwrap();

    let mut scanner = table.new_scanner();
    scanner.open().unwrap();
    let mut batch = scanner.next_batch().unwrap();
    assert!(batch.next());
    assert_eq!(batch.get_string("state").unwrap(), "new");
    assert!(batch.is_null("score").unwrap());
}
