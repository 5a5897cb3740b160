//! Tests for pipeline module

use super::*;
use crate::config::{FlattenConfig, SamplingConfig};
use crate::output::read_parquet_rows;
use crate::types::OutputFormat;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_jsonl(path: &Path, lines: &[&str]) {
    fs::write(path, lines.join("\n") + "\n").unwrap();
}

fn pattern(dir: &Path, glob: &str) -> String {
    dir.join(glob).to_string_lossy().to_string()
}

// ============================================================================
// Flatten Tests
// ============================================================================

#[test]
fn test_run_flatten_csv() {
    let dir = tempdir().unwrap();
    write_jsonl(
        &dir.path().join("one.json"),
        &[r#"{"a":1,"b":{"c":2}}"#, r#"{"a":3,"d":4}"#],
    );

    let config = FlattenConfig {
        patterns: vec![pattern(dir.path(), "*.json")],
        ..FlattenConfig::default()
    };
    let report = run_flatten(&config).unwrap();

    assert_eq!(report.columns, vec!["a", "b", "b.c", "d"]);
    assert_eq!(report.total_rows(), 2);
    assert_eq!(report.files[0].output, dir.path().join("one.csv"));

    let text = fs::read_to_string(dir.path().join("one.csv")).unwrap();
    assert_eq!(text, "a,b,b.c,d\n1,\"{\"\"c\"\":2}\",2,\n3,,,4\n");
}

#[test]
fn test_run_flatten_shares_schema_across_files() {
    let dir = tempdir().unwrap();
    write_jsonl(&dir.path().join("a.json"), &[r#"{"x":1}"#]);
    write_jsonl(&dir.path().join("b.json"), &[r#"{"y":{"z":true}}"#]);

    let config = FlattenConfig {
        patterns: vec![pattern(dir.path(), "*.json")],
        format: OutputFormat::Parquet,
        batch_rows: 1,
        ..FlattenConfig::default()
    };
    let report = run_flatten(&config).unwrap();
    assert_eq!(report.files.len(), 2);

    let (header, rows) = read_parquet_rows(dir.path().join("a.parquet")).unwrap();
    assert_eq!(header, vec!["x", "y", "y.z"]);
    assert_eq!(rows, vec![vec!["1".to_string(), String::new(), String::new()]]);

    let (_, rows) = read_parquet_rows(dir.path().join("b.parquet")).unwrap();
    assert_eq!(
        rows,
        vec![vec![
            String::new(),
            r#"{"z":true}"#.to_string(),
            "True".to_string()
        ]]
    );
}

#[test]
fn test_run_flatten_expand_dicts() {
    let dir = tempdir().unwrap();
    write_jsonl(
        &dir.path().join("biz.json"),
        &[r#"{"id":"b1","attributes":{"BusinessParking":"{'garage': False, 'lot': True}"}}"#],
    );

    let config = FlattenConfig {
        patterns: vec![pattern(dir.path(), "*.json")],
        expand_dicts: true,
        ..FlattenConfig::default()
    };
    let report = run_flatten(&config).unwrap();
    assert_eq!(
        report.columns,
        vec![
            "attributes",
            "attributes.BusinessParking",
            "attributes.BusinessParking.garage",
            "attributes.BusinessParking.lot",
            "id",
        ]
    );
}

#[test]
fn test_run_flatten_out_with_many_inputs_fails_before_writing() {
    let dir = tempdir().unwrap();
    write_jsonl(&dir.path().join("a.json"), &[r#"{"x":1}"#]);
    write_jsonl(&dir.path().join("b.json"), &[r#"{"x":2}"#]);
    let out = dir.path().join("out.csv");

    let config = FlattenConfig {
        patterns: vec![pattern(dir.path(), "*.json")],
        output: Some(out.clone()),
        ..FlattenConfig::default()
    };
    let err = run_flatten(&config).unwrap_err();
    assert!(err.is_config_error());
    assert!(!out.exists());
}

#[test]
fn test_run_flatten_no_inputs() {
    let dir = tempdir().unwrap();
    let config = FlattenConfig {
        patterns: vec![pattern(dir.path(), "*.json")],
        ..FlattenConfig::default()
    };
    assert!(run_flatten(&config).unwrap_err().is_config_error());
}

#[test]
fn test_run_flatten_rejects_non_object_line() {
    let dir = tempdir().unwrap();
    write_jsonl(&dir.path().join("bad.json"), &[r#"{"x":1}"#, "[1,2]"]);

    let config = FlattenConfig {
        patterns: vec![pattern(dir.path(), "*.json")],
        ..FlattenConfig::default()
    };
    assert!(run_flatten(&config).is_err());
}

// ============================================================================
// Sampling Tests
// ============================================================================

const REVIEWS: &str = "\
review_id,business_id,stars,useful,text,date
r1,b1,5,0,Absolutely loved the green chile stew,2015-02-01 18:00:00
r2,b1,1,2,Cold food and a very long wait,2015-02-02 18:00:00
r3,b2,3,0,It was fine but nothing special here,2016-02-03 18:00:00
r4,b2,5.0,1,Best brunch in the whole neighborhood,2017-02-04 18:00:00
r5,b3,4,0,Tiny,2017-02-04 18:00:00
r6,b3,4,0,Great staff and a cozy dining room,2021-02-04 18:00:00
";

const BUSINESSES: &str = "\
business_id,name,city,categories
b1,Chile House,Phoenix,Restaurants
b2,Morning Table,Tempe,Breakfast & Brunch
b3,Cozy Corner,Phoenix,Restaurants
";

fn sampling_fixture(dir: &Path) -> SamplingConfig {
    fs::write(dir.join("reviews.csv"), REVIEWS).unwrap();
    fs::write(dir.join("business.csv"), BUSINESSES).unwrap();
    SamplingConfig {
        reviews_path: dir.join("reviews.csv"),
        businesses_path: dir.join("business.csv"),
        output_path: dir.join("processed").join("sample.csv"),
        target_cities: Vec::new(),
        samples_per_bucket: 5,
        chunk_size: 2,
        ..SamplingConfig::default()
    }
}

#[test]
fn test_run_sampling_by_star() {
    let dir = tempdir().unwrap();
    let config = sampling_fixture(dir.path());

    let report = run_sampling(&config, SamplingMode::ByStar).unwrap();
    assert_eq!(report.sampled, 4);
    assert_eq!(report.rows_read, 6);
    assert!(!report.saturated);
    assert_eq!(report.star_distribution.get("5"), Some(&1));
    assert_eq!(report.star_distribution.get("5.0"), Some(&1));

    let mut reader = csv::Reader::from_path(&config.output_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        headers,
        vec![
            "text",
            "stars",
            "date",
            "business_id",
            "text_clean",
            "text_length",
            "word_count",
            "sentiment_binary",
            "sentiment_multiclass",
        ]
    );
    let first = reader.records().next().unwrap().unwrap();
    assert_eq!(&first[0], "Cold food and a very long wait");
    assert_eq!(&first[8], "negative");
}

#[test]
fn test_run_sampling_by_city() {
    let dir = tempdir().unwrap();
    let config = SamplingConfig {
        samples_per_bucket: 1,
        ..sampling_fixture(dir.path())
    };

    let outcome = draw_sample(&config, SamplingMode::ByCityAndStar).unwrap();
    let cities: Vec<&str> = outcome
        .bucket_counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(label, _)| label.as_str())
        .collect();
    assert_eq!(
        cities,
        vec![
            "Phoenix - 1 star",
            "Phoenix - 5 star",
            "Tempe - 3 star",
            "Tempe - 5 star"
        ]
    );
    assert_eq!(outcome.frame.value(0, "name"), Some("Chile House"));

    let report = run_sampling(&config, SamplingMode::ByCityAndStar).unwrap();
    assert_eq!(report.sampled, 4);
    assert!(config.output_path.exists());
}

#[test]
fn test_run_sampling_missing_input() {
    let dir = tempdir().unwrap();
    let config = SamplingConfig {
        reviews_path: dir.path().join("missing.csv"),
        output_path: dir.path().join("out.csv"),
        ..SamplingConfig::default()
    };
    assert!(run_sampling(&config, SamplingMode::ByStar).is_err());
    assert!(!config.output_path.exists());
}

#[test]
fn test_star_distribution() {
    let frame = crate::reviews::Frame::from_rows(
        ["stars"],
        vec![
            vec![Some("5".to_string())],
            vec![Some("5".to_string())],
            vec![None],
        ],
    )
    .unwrap();
    let counts = star_distribution(&frame);
    assert_eq!(counts.get("5"), Some(&2));
    assert_eq!(counts.get(""), Some(&1));
}
