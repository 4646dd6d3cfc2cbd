//! Tests for Scanner and ScanBatch
//!
//! These tests verify:
//! - Paging and `has_more_rows` termination
//! - Projection, predicates and limits
//! - Typed accessors and row rendering
//! - Cursor release on close and drop
//! - Cursor invalidation surfaces as a transmission error

use kudu_client::scanner::ScannerState;
use kudu_client::{
    Client, ColumnPredicate, ComparisonOp, DataType, ErrorKind, FlushMode, KuduError,
    MemoryCluster, SchemaBuilder, Table, ValidationError,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// Table `scan` (c1 INT32 key, name STRING, flag BOOL) holding `rows` rows;
/// rows with an even key have a NULL name
fn setup_with_rows(rows: i32) -> (MemoryCluster, Client, Table) {
    let cluster = MemoryCluster::new();
    let client = Client::builder()
        .add_master_server_addr("localhost")
        .connector(cluster.clone())
        .build()
        .unwrap();

    let mut builder = SchemaBuilder::new();
    builder
        .add_column("c1")
        .data_type(DataType::Int32)
        .not_null()
        .primary_key();
    builder.add_column("name").data_type(DataType::String);
    builder.add_column("flag").data_type(DataType::Bool).not_null();
    let schema = builder.build().unwrap();

    client
        .new_table_creator()
        .table_name("scan")
        .schema(&schema)
        .add_hash_partitions(["c1"], 3)
        .num_replicas(1)
        .create()
        .unwrap();
    let table = client.open_table("scan").unwrap();

    let mut session = client.new_session();
    session.set_flush_mode(FlushMode::ManualFlush).unwrap();
    for i in 0..rows {
        let mut insert = table.new_insert();
        insert.set_int32("c1", i).unwrap().set_bool("flag", i % 3 == 0).unwrap();
        if i % 2 == 1 {
            insert.set_string("name", format!("row-{}", i)).unwrap();
        }
        session.apply(insert).unwrap();
    }
    session.flush().unwrap();
    session.close().unwrap();

    (cluster, client, table)
}

/// Drain a scanner, returning every `c1` seen
fn collect_keys(scanner: &mut kudu_client::Scanner) -> Vec<i32> {
    let mut keys = Vec::new();
    while scanner.has_more_rows() {
        let mut batch = scanner.next_batch().unwrap();
        while batch.next() {
            keys.push(batch.get_int32("c1").unwrap());
        }
    }
    keys.sort_unstable();
    keys
}

// =============================================================================
// Paging Tests
// =============================================================================

#[test]
fn test_full_scan_returns_every_row_once() {
    let (_cluster, _client, table) = setup_with_rows(25);
    let mut scanner = table.new_scanner();
    scanner.set_batch_size_rows(4).unwrap();
    scanner.open().unwrap();

    assert_eq!(collect_keys(&mut scanner), (0..25).collect::<Vec<_>>());
    assert_eq!(scanner.state(), ScannerState::Exhausted);
}

#[test]
fn test_has_more_rows_termination() {
    let (_cluster, _client, table) = setup_with_rows(10);
    let mut scanner = table.new_scanner();
    scanner.set_batch_size_rows(5).unwrap();
    assert!(!scanner.has_more_rows());
    scanner.open().unwrap();

    let mut pages = Vec::new();
    while scanner.has_more_rows() {
        pages.push(scanner.next_batch().unwrap().num_rows());
    }
    assert_eq!(pages, vec![5, 5]);

    // Past the end: empty batches, still no more rows
    assert!(scanner.next_batch().unwrap().is_empty());
    assert!(!scanner.has_more_rows());
}

#[test]
fn test_empty_table_scan() {
    let (cluster, _client, table) = setup_with_rows(0);
    let mut scanner = table.new_scanner();
    scanner.open().unwrap();

    assert!(scanner.has_more_rows());
    let mut batch = scanner.next_batch().unwrap();
    assert!(!batch.next());
    drop(batch);
    assert!(!scanner.has_more_rows());
    assert_eq!(cluster.open_scanner_count(), 0);
}

#[test]
fn test_rescan_is_idempotent() {
    let (_cluster, _client, table) = setup_with_rows(12);
    let mut first = table.new_scanner();
    first.open().unwrap();
    let mut second = table.new_scanner();
    second.open().unwrap();

    assert_eq!(collect_keys(&mut first), collect_keys(&mut second));
}

#[test]
fn test_next_batch_before_open_fails() {
    let (_cluster, _client, table) = setup_with_rows(1);
    let mut scanner = table.new_scanner();
    let err = scanner.next_batch().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

// =============================================================================
// Projection, Predicate & Limit Tests
// =============================================================================

#[test]
fn test_projection_limits_columns() {
    let (_cluster, _client, table) = setup_with_rows(3);
    let mut scanner = table.new_scanner();
    scanner.set_projected_columns(["flag", "c1"]).unwrap();
    scanner.open().unwrap();

    let mut batch = scanner.next_batch().unwrap();
    let names: Vec<&str> = batch.projection().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["flag", "c1"]);
    assert!(batch.next());
    assert_eq!(batch.current_row().unwrap().len(), 2);

    let err = batch.get_string("name").unwrap_err();
    assert!(matches!(
        err,
        KuduError::Validation(ValidationError::UnknownColumn { .. })
    ));
}

#[test]
fn test_unknown_projected_column_rejected() {
    let (_cluster, _client, table) = setup_with_rows(1);
    let mut scanner = table.new_scanner();
    let err = scanner.set_projected_columns(["missing"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_comparison_predicates() {
    let (_cluster, _client, table) = setup_with_rows(20);
    let mut scanner = table.new_scanner();
    scanner
        .add_predicate(ColumnPredicate::comparison("c1", ComparisonOp::GreaterEqual, 5i32))
        .unwrap();
    scanner
        .add_predicate(ColumnPredicate::comparison("c1", ComparisonOp::Less, 9i32))
        .unwrap();
    scanner.open().unwrap();

    assert_eq!(collect_keys(&mut scanner), vec![5, 6, 7, 8]);
}

#[test]
fn test_null_and_in_list_predicates() {
    let (_cluster, _client, table) = setup_with_rows(10);

    let mut scanner = table.new_scanner();
    scanner.add_predicate(ColumnPredicate::is_null("name")).unwrap();
    scanner.open().unwrap();
    assert_eq!(collect_keys(&mut scanner), vec![0, 2, 4, 6, 8]);

    let mut scanner = table.new_scanner();
    scanner
        .add_predicate(ColumnPredicate::in_list("c1", [1i32, 4, 42]))
        .unwrap();
    scanner.open().unwrap();
    assert_eq!(collect_keys(&mut scanner), vec![1, 4]);
}

#[test]
fn test_predicate_type_mismatch_rejected() {
    let (_cluster, _client, table) = setup_with_rows(1);
    let mut scanner = table.new_scanner();
    let err = scanner
        .add_predicate(ColumnPredicate::comparison("c1", ComparisonOp::Equal, "one"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_limit() {
    let (_cluster, _client, table) = setup_with_rows(30);
    let mut scanner = table.new_scanner();
    scanner.set_limit(7).unwrap();
    scanner.set_batch_size_rows(3).unwrap();
    scanner.open().unwrap();

    assert_eq!(collect_keys(&mut scanner).len(), 7);
}

#[test]
fn test_configuration_after_open_fails() {
    let (_cluster, _client, table) = setup_with_rows(1);
    let mut scanner = table.new_scanner();
    scanner.open().unwrap();

    assert_eq!(
        scanner.set_batch_size_rows(10).unwrap_err().kind(),
        ErrorKind::InvalidState
    );
    assert_eq!(scanner.open().unwrap_err().kind(), ErrorKind::InvalidState);
}

// =============================================================================
// Scan Batch Accessor Tests
// =============================================================================

#[test]
fn test_typed_accessors() {
    let (_cluster, _client, table) = setup_with_rows(4);
    let mut scanner = table.new_scanner();
    scanner
        .add_predicate(ColumnPredicate::comparison("c1", ComparisonOp::Equal, 3i32))
        .unwrap();
    scanner.open().unwrap();

    let mut batch = scanner.next_batch().unwrap();
    assert!(batch.current_row().is_err());
    assert!(batch.next());
    assert_eq!(batch.get_int32("c1").unwrap(), 3);
    assert_eq!(batch.get_string("name").unwrap(), "row-3");
    assert!(batch.get_bool("flag").unwrap());
    assert!(!batch.is_null("name").unwrap());

    let err = batch.get_int64("c1").unwrap_err();
    assert!(matches!(
        err,
        KuduError::Validation(ValidationError::TypeMismatch { .. })
    ));
    assert!(!batch.next());
}

#[test]
fn test_null_cell_access() {
    let (_cluster, _client, table) = setup_with_rows(1);
    let mut scanner = table.new_scanner();
    scanner.open().unwrap();

    let mut batch = scanner.next_batch().unwrap();
    assert!(batch.next());
    assert!(batch.is_null("name").unwrap());
    assert_eq!(batch.get_value("name").unwrap(), None);
    assert!(matches!(
        batch.get_string("name").unwrap_err(),
        KuduError::Validation(ValidationError::NullValue { .. })
    ));
}

#[test]
fn test_row_to_string() {
    let (_cluster, _client, table) = setup_with_rows(2);
    let mut scanner = table.new_scanner();
    scanner
        .add_predicate(ColumnPredicate::comparison("c1", ComparisonOp::Equal, 1i32))
        .unwrap();
    scanner.open().unwrap();

    let mut batch = scanner.next_batch().unwrap();
    assert!(batch.next());
    assert_eq!(
        batch.row_to_string().unwrap(),
        "(int32 c1=1, string name=\"row-1\", bool flag=false)"
    );
}

// =============================================================================
// Cursor Lifecycle Tests
// =============================================================================

#[test]
fn test_close_mid_scan_releases_cursor() {
    let (cluster, _client, table) = setup_with_rows(10);
    let mut scanner = table.new_scanner();
    scanner.set_batch_size_rows(2).unwrap();
    scanner.open().unwrap();
    assert_eq!(cluster.open_scanner_count(), 1);

    scanner.next_batch().unwrap();
    scanner.close().unwrap();
    assert_eq!(cluster.open_scanner_count(), 0);
    assert_eq!(scanner.state(), ScannerState::Closed);
    assert_eq!(scanner.next_batch().unwrap_err().kind(), ErrorKind::InvalidState);

    // Closing twice is harmless
    scanner.close().unwrap();
}

#[test]
fn test_drop_releases_cursor() {
    let (cluster, _client, table) = setup_with_rows(10);
    {
        let mut scanner = table.new_scanner();
        scanner.set_batch_size_rows(3).unwrap();
        scanner.open().unwrap();
        assert_eq!(cluster.open_scanner_count(), 1);
    }
    assert_eq!(cluster.open_scanner_count(), 0);
}

#[test]
fn test_exhausted_scan_holds_no_cursor() {
    let (cluster, _client, table) = setup_with_rows(6);
    let mut scanner = table.new_scanner();
    scanner.set_batch_size_rows(2).unwrap();
    scanner.open().unwrap();
    collect_keys(&mut scanner);

    assert_eq!(cluster.open_scanner_count(), 0);
    scanner.close().unwrap();
}

#[test]
fn test_cursor_invalidation_is_transmission_error() {
    let (cluster, _client, table) = setup_with_rows(10);
    let mut scanner = table.new_scanner();
    scanner.set_batch_size_rows(2).unwrap();
    scanner.open().unwrap();
    scanner.next_batch().unwrap();

    cluster.restart();
    let err = scanner.next_batch().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transmission);
}

#[test]
fn test_scan_of_deleted_table_not_found() {
    let (_cluster, client, table) = setup_with_rows(3);
    client.delete_table("scan").unwrap();

    let mut scanner = table.new_scanner();
    let err = scanner.open().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_scan_after_client_close_fails() {
    let (_cluster, client, table) = setup_with_rows(3);
    let mut scanner = table.new_scanner();
    client.close();

    assert_eq!(scanner.open().unwrap_err().kind(), ErrorKind::InvalidState);
}
