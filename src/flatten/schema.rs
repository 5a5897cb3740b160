//! Column schema discovery (pass 1)

use super::paths::extend_paths;
use super::reader::JsonlRecords;
use crate::error::Result;
use crate::types::JsonObject;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Sorted, duplicate-free list of dotted column paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<String>,
}

impl ColumnSchema {
    /// Build a schema from any collection of paths
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = paths.into_iter().map(Into::into).collect();
        Self {
            columns: set.into_iter().collect(),
        }
    }

    /// Column paths in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column was discovered
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Check whether a path is part of the schema
    pub fn contains(&self, path: &str) -> bool {
        self.columns
            .binary_search_by(|c| c.as_str().cmp(path))
            .is_ok()
    }

    /// Position of a path in the schema
    pub fn position(&self, path: &str) -> Option<usize> {
        self.columns.binary_search_by(|c| c.as_str().cmp(path)).ok()
    }
}

/// Accumulates the union of paths over many records
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    expand: bool,
    paths: BTreeSet<String>,
    records: usize,
}

impl SchemaBuilder {
    /// Create an empty builder
    pub fn new(expand: bool) -> Self {
        Self {
            expand,
            ..Default::default()
        }
    }

    /// Add the paths of one record
    pub fn add_record(&mut self, record: &JsonObject) {
        extend_paths(record, self.expand, &mut self.paths);
        self.records += 1;
    }

    /// Scan a whole JSON Lines file, returning its record count
    pub fn scan_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let before = self.records;
        for record in JsonlRecords::open(path)? {
            self.add_record(&record?);
        }
        let scanned = self.records - before;
        debug!(
            "Scanned {} records from {}, {} paths so far",
            scanned,
            path.display(),
            self.paths.len()
        );
        Ok(scanned)
    }

    /// Number of records seen
    pub fn records_seen(&self) -> usize {
        self.records
    }

    /// Finish and return the sorted schema
    pub fn build(self) -> ColumnSchema {
        ColumnSchema {
            columns: self.paths.into_iter().collect(),
        }
    }
}

/// Discover the column schema of a set of JSON Lines files
///
/// Files are read one at a time, in the given order. Records are not kept,
/// so memory is bounded by the number of distinct paths.
pub fn discover_schema<P: AsRef<Path>>(paths: &[P], expand: bool) -> Result<ColumnSchema> {
    let mut builder = SchemaBuilder::new(expand);
    for path in paths {
        builder.scan_file(path)?;
    }
    Ok(builder.build())
}
