//! Tests for flatten module

use super::*;
use crate::types::{JsonObject, JsonValue};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Cursor;
use std::io::Write;
use tempfile::tempdir;

fn obj(value: JsonValue) -> JsonObject {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

// ============================================================================
// Mapping String Tests
// ============================================================================

#[test]
fn test_looks_like_mapping() {
    assert!(looks_like_mapping("{'a': 1}"));
    assert!(looks_like_mapping("  {\"a\": 1}  "));
    assert!(!looks_like_mapping("u'free'"));
    assert!(!looks_like_mapping("[1, 2]"));
    assert!(!looks_like_mapping("{ unterminated"));
}

#[test]
fn test_parse_mapping_json() {
    let map = parse_mapping(r#"{"garage": false, "lot": true}"#).unwrap();
    assert_eq!(map["garage"], json!(false));
    assert_eq!(map["lot"], json!(true));
}

#[test]
fn test_parse_mapping_python_literal() {
    let map = parse_mapping("{'garage': False, 'street': True, 'valet': None}").unwrap();
    assert_eq!(map["garage"], json!(false));
    assert_eq!(map["street"], json!(true));
    assert_eq!(map["valet"], JsonValue::Null);
}

#[test]
fn test_parse_mapping_nested_literal() {
    let map = parse_mapping("{'a': {'b': [1, 2.5, -3]}, 'c': u'free', 'd': (1, 'x')}").unwrap();
    assert_eq!(map["a"], json!({"b": [1, 2.5, -3]}));
    assert_eq!(map["c"], json!("free"));
    assert_eq!(map["d"], json!([1, "x"]));
}

#[test]
fn test_parse_mapping_escapes() {
    let map = parse_mapping(r"{'q': 'it\'s', 'nl': 'a\nb'}").unwrap();
    assert_eq!(map["q"], json!("it's"));
    assert_eq!(map["nl"], json!("a\nb"));
}

#[test]
fn test_parse_mapping_rejects_malformed() {
    assert!(parse_mapping("{'a': }").is_none());
    assert!(parse_mapping("{'a': 1} trailing }").is_none());
    assert!(parse_mapping("{__import__('os'): 1}").is_none());
    assert!(parse_mapping("{1, 2}").is_none());
}

#[test]
fn test_expand_value_keeps_opaque_strings() {
    let value = json!("{not a dict}");
    assert_eq!(expand_value(&value).into_owned(), value);

    let value = json!("{'k': 1}");
    assert_eq!(expand_value(&value).into_owned(), json!({"k": 1}));

    let value = json!(42);
    assert_eq!(expand_value(&value).into_owned(), value);
}

// ============================================================================
// Path Flattening Tests
// ============================================================================

#[test]
fn test_flatten_paths_parent_and_children() {
    let record = obj(json!({"a": 1, "b": {"c": 2, "d": {"e": 3}}}));
    let paths: Vec<String> = flatten_paths(&record, false).into_iter().collect();
    assert_eq!(paths, vec!["a", "b", "b.c", "b.d", "b.d.e"]);
}

#[test]
fn test_flatten_paths_does_not_enter_lists() {
    let record = obj(json!({"tags": [{"x": 1}], "n": null}));
    let paths: Vec<String> = flatten_paths(&record, false).into_iter().collect();
    assert_eq!(paths, vec!["n", "tags"]);
}

#[test]
fn test_flatten_paths_expand_flag() {
    let record = obj(json!({"attributes": {"Parking": "{'garage': False, 'lot': True}"}}));

    let plain: Vec<String> = flatten_paths(&record, false).into_iter().collect();
    assert_eq!(plain, vec!["attributes", "attributes.Parking"]);

    let expanded: Vec<String> = flatten_paths(&record, true).into_iter().collect();
    assert_eq!(
        expanded,
        vec![
            "attributes",
            "attributes.Parking",
            "attributes.Parking.garage",
            "attributes.Parking.lot",
        ]
    );
}

#[test]
fn test_flatten_paths_malformed_string_is_scalar() {
    let record = obj(json!({"x": "{'broken': }"}));
    let paths: Vec<String> = flatten_paths(&record, true).into_iter().collect();
    assert_eq!(paths, vec!["x"]);
}

#[test]
fn test_resolve_path() {
    let record = obj(json!({"a": {"b": {"c": 5}}, "n": null, "s": "text"}));

    assert_eq!(resolve_path(&record, "a.b.c"), Some(&json!(5)));
    assert!(resolve_path(&record, "a.x").is_none());
    assert!(resolve_path(&record, "n").is_none());
    assert!(resolve_path(&record, "n.deeper").is_none());
    assert!(resolve_path(&record, "s.deeper").is_none());
}

#[test]
fn test_resolve_path_stops_at_mapping_string() {
    let record = obj(json!({"attrs": {"Parking": "{'garage': False}"}}));

    assert!(resolve_path(&record, "attrs.Parking.garage").is_none());
    assert_eq!(
        resolve_path(&record, "attrs.Parking"),
        Some(&json!("{'garage': False}"))
    );
}

#[test]
fn test_expanded_children_stay_empty() {
    let record = obj(json!({"p": "{'g': False}", "t": true}));
    let schema = ColumnSchema::from_paths(flatten_paths(&record, true));
    assert_eq!(schema.columns(), &["p", "p.g", "t"]);

    let row = RowMaterializer::new(&schema, true).materialize(&record);
    assert_eq!(row, vec![r#"{"g":false}"#, "", "True"]);
}

// ============================================================================
// Schema Tests
// ============================================================================

#[test]
fn test_column_schema_sorted_and_unique() {
    let schema = ColumnSchema::from_paths(["b", "a", "b.c", "a"]);
    assert_eq!(schema.columns(), &["a", "b", "b.c"]);
    assert!(schema.contains("b.c"));
    assert_eq!(schema.position("b"), Some(1));
    assert!(!schema.contains("c"));
}

#[test]
fn test_schema_builder_union() {
    let mut builder = SchemaBuilder::new(false);
    builder.add_record(&obj(json!({"a": 1, "b": {"c": 2}})));
    builder.add_record(&obj(json!({"a": 3, "d": 4})));
    assert_eq!(builder.records_seen(), 2);

    let schema = builder.build();
    assert_eq!(schema.columns(), &["a", "b", "b.c", "d"]);
}

#[test]
fn test_schema_independent_of_record_order() {
    let records = [
        obj(json!({"z": 1})),
        obj(json!({"m": {"n": 1}})),
        obj(json!({"a": 1, "z": 2})),
    ];

    let mut forward = SchemaBuilder::new(false);
    records.iter().for_each(|r| forward.add_record(r));

    let mut backward = SchemaBuilder::new(false);
    records.iter().rev().for_each(|r| backward.add_record(r));

    assert_eq!(forward.build(), backward.build());
}

#[test]
fn test_discover_schema_across_files() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    let mut f = std::fs::File::create(&first).unwrap();
    writeln!(f, r#"{{"id": 1, "hours": {{"Monday": "9-5"}}}}"#).unwrap();
    writeln!(f).unwrap();
    let mut f = std::fs::File::create(&second).unwrap();
    writeln!(f, r#"{{"id": 2, "hours": {{"Tuesday": "9-5"}}, "city": "Tempe"}}"#).unwrap();

    let schema = discover_schema(&[first, second], false).unwrap();
    assert_eq!(
        schema.columns(),
        &["city", "hours", "hours.Monday", "hours.Tuesday", "id"]
    );
}

#[test]
fn test_discover_schema_rejects_non_object_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{\"a\": 1}\n[1, 2]\n").unwrap();

    let err = discover_schema(&[path], false).unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn test_jsonl_records_skip_blank_lines() {
    let input = "{\"a\": 1}\n\n   \n{\"a\": 2}\n";
    let records: Vec<JsonObject> = JsonlRecords::new(Cursor::new(input), "inline")
        .collect::<crate::error::Result<_>>()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["a"], json!(2));
}

// ============================================================================
// Row Materialization Tests
// ============================================================================

#[test]
fn test_materialize_end_to_end_example() {
    let first = obj(json!({"a": 1, "b": {"c": 2}}));
    let second = obj(json!({"a": 3, "d": 4}));

    let mut builder = SchemaBuilder::new(false);
    builder.add_record(&first);
    builder.add_record(&second);
    let schema = builder.build();
    assert_eq!(schema.columns(), &["a", "b", "b.c", "d"]);

    let materializer = RowMaterializer::new(&schema, false);
    assert_eq!(materializer.materialize(&first), vec!["1", r#"{"c":2}"#, "2", ""]);
    assert_eq!(materializer.materialize(&second), vec!["3", "", "", "4"]);
}

#[test]
fn test_materialize_width_matches_schema() {
    let schema = ColumnSchema::from_paths(["a", "b", "b.c", "d", "e.f.g"]);
    let materializer = RowMaterializer::new(&schema, false);

    for record in [json!({}), json!({"a": 1}), json!({"e": {"f": "x"}})] {
        let row = materializer.materialize(&obj(record));
        assert_eq!(row.len(), schema.len());
    }
}

#[test]
fn test_materialize_is_idempotent() {
    let record = obj(json!({"a": [1, {"x": 2}], "b": {"c": "{'k': 1}"}, "t": true}));
    let schema = ColumnSchema::from_paths(flatten_paths(&record, true));
    let materializer = RowMaterializer::new(&schema, true);

    assert_eq!(materializer.materialize(&record), materializer.materialize(&record));
}

#[test]
fn test_materialize_expand_renders_parsed_mapping() {
    let record = obj(json!({"p": "{'garage': False, 'lot': True}", "s": "{oops"}));
    let schema = ColumnSchema::from_paths(flatten_paths(&record, true));
    assert_eq!(schema.columns(), &["p", "p.garage", "p.lot", "s"]);

    let row = RowMaterializer::new(&schema, true).materialize(&record);
    assert_eq!(row, vec![r#"{"garage":false,"lot":true}"#, "", "", "{oops"]);

    let row = RowMaterializer::new(&schema, false).materialize(&record);
    assert_eq!(row, vec!["{'garage': False, 'lot': True}", "", "", "{oops"]);
}

#[test]
fn test_render_value() {
    assert_eq!(render_value(&JsonValue::Null), "");
    assert_eq!(render_value(&json!("plain")), "plain");
    assert_eq!(render_value(&json!(4.5)), "4.5");
    assert_eq!(render_value(&json!(false)), "False");
    assert_eq!(render_value(&json!(true)), "True");
    assert_eq!(render_value(&json!(["a", 1])), r#"["a",1]"#);
    assert_eq!(render_value(&json!({"z": 1, "a": 2})), r#"{"z":1,"a":2}"#);
}
