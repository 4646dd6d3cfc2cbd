//! Tests for SchemaBuilder
//!
//! These tests verify:
//! - Key columns are moved to the front of the schema
//! - Every build-time validation rule
//! - A failed build leaves the builder usable
//! - A built schema is unaffected by later builder changes

use kudu_client::{DataType, ErrorKind, SchemaBuilder, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn metrics_builder() -> SchemaBuilder {
    let mut builder = SchemaBuilder::new();
    builder.add_column("value").data_type(DataType::Double);
    builder.add_column("host").data_type(DataType::String).not_null();
    builder.add_column("ts").data_type(DataType::UnixtimeMicros).not_null();
    builder.set_primary_key(["host", "ts"]);
    builder
}

fn assert_schema_error(builder: &SchemaBuilder, needle: &str) {
    let err = builder.build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema, "{}", err);
    assert!(
        err.to_string().contains(needle),
        "expected '{}' in '{}'",
        needle,
        err
    );
}

// =============================================================================
// Successful Builds
// =============================================================================

#[test]
fn test_key_columns_lead_schema() {
    let schema = metrics_builder().build().unwrap();

    let names: Vec<&str> = schema.columns().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["host", "ts", "value"]);
    assert_eq!(schema.num_key_columns(), 2);
    assert!(schema.is_key_column(1));
    assert!(!schema.is_key_column(2));
    assert_eq!(schema.find_column("value"), Some(2));
}

#[test]
fn test_primary_key_marked_on_column() {
    let mut builder = SchemaBuilder::new();
    builder
        .add_column("c1")
        .data_type(DataType::Int32)
        .not_null()
        .primary_key();
    builder.add_column("name").data_type(DataType::String).nullable();

    let schema = builder.build().unwrap();
    assert_eq!(schema.num_key_columns(), 1);
    assert!(schema.column(0).unwrap().is_key());
    assert!(schema.column_by_name("name").unwrap().is_nullable());
}

#[test]
fn test_default_value_kept() {
    let mut builder = SchemaBuilder::new();
    builder
        .add_column("id")
        .data_type(DataType::Int64)
        .not_null()
        .primary_key();
    builder
        .add_column("state")
        .data_type(DataType::String)
        .not_null()
        .default_value("new");

    let schema = builder.build().unwrap();
    assert_eq!(
        schema.column_by_name("state").unwrap().default_value(),
        Some(&Value::from("new"))
    );
}

#[test]
fn test_schema_display() {
    let mut builder = SchemaBuilder::new();
    builder
        .add_column("c1")
        .data_type(DataType::Int32)
        .not_null()
        .primary_key();
    let schema = builder.build().unwrap();

    let rendered = schema.to_string();
    assert!(rendered.contains("c1 INT32 NOT NULL"), "{}", rendered);
    assert!(rendered.contains("PRIMARY KEY"), "{}", rendered);
}

// =============================================================================
// Validation Failures
// =============================================================================

#[test]
fn test_no_primary_key_fails() {
    let mut builder = SchemaBuilder::new();
    builder.add_column("c1").data_type(DataType::Int32).not_null();
    assert_schema_error(&builder, "primary key");
}

#[test]
fn test_duplicate_column_fails() {
    let mut builder = SchemaBuilder::new();
    builder
        .add_column("c1")
        .data_type(DataType::Int32)
        .not_null()
        .primary_key();
    builder.add_column("c1").data_type(DataType::String);
    assert_schema_error(&builder, "c1");
}

#[test]
fn test_empty_schema_fails() {
    let builder = SchemaBuilder::new();
    assert!(builder.build().is_err());
}

#[test]
fn test_unknown_key_column_fails() {
    let mut builder = SchemaBuilder::new();
    builder.add_column("c1").data_type(DataType::Int32).not_null();
    builder.set_primary_key(["missing"]);
    assert_schema_error(&builder, "missing");
}

#[test]
fn test_nullable_key_fails() {
    let mut builder = SchemaBuilder::new();
    builder
        .add_column("c1")
        .data_type(DataType::Int32)
        .primary_key()
        .nullable();
    assert_schema_error(&builder, "NOT NULL");
}

#[test]
fn test_float_key_fails() {
    let mut builder = SchemaBuilder::new();
    builder
        .add_column("f")
        .data_type(DataType::Double)
        .not_null()
        .primary_key();
    assert_schema_error(&builder, "f");
}

#[test]
fn test_default_type_mismatch_fails() {
    let mut builder = SchemaBuilder::new();
    builder
        .add_column("c1")
        .data_type(DataType::Int32)
        .not_null()
        .primary_key();
    builder
        .add_column("count")
        .data_type(DataType::Int64)
        .default_value("zero");
    assert_schema_error(&builder, "count");
}

#[test]
fn test_missing_type_fails() {
    let mut builder = SchemaBuilder::new();
    builder.add_column("c1").not_null().primary_key();
    assert_schema_error(&builder, "c1");
}

#[test]
fn test_key_declared_twice_fails() {
    let mut builder = SchemaBuilder::new();
    builder
        .add_column("c1")
        .data_type(DataType::Int32)
        .not_null()
        .primary_key();
    builder.set_primary_key(["c1"]);
    assert!(builder.build().is_err());
}

// =============================================================================
// Builder Lifecycle
// =============================================================================

#[test]
fn test_failed_build_can_be_corrected() {
    let mut builder = SchemaBuilder::new();
    builder.add_column("c1").data_type(DataType::Int32).not_null();
    assert!(builder.build().is_err());

    builder.set_primary_key(["c1"]);
    let schema = builder.build().unwrap();
    assert_eq!(schema.num_key_columns(), 1);
}

#[test]
fn test_schema_immutable_after_build() {
    let mut builder = metrics_builder();
    let schema = builder.build().unwrap();

    builder.add_column("extra").data_type(DataType::Bool);
    builder.add_column("value").data_type(DataType::Float);

    assert_eq!(schema.num_columns(), 3);
    assert!(schema.find_column("extra").is_none());
    assert_eq!(
        schema.column_by_name("value").unwrap().data_type(),
        DataType::Double
    );
}
