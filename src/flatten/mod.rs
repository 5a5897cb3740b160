//! Flatten module
//!
//! Turns nested JSON Lines records into flat, schema-aligned rows.
//!
//! # Overview
//!
//! Flattening is two-pass:
//! - **Pass 1**: every record of every input is scanned and the union of its
//!   dotted paths becomes a sorted [`ColumnSchema`]
//! - **Pass 2**: each record is materialized into one cell per column
//!
//! Parent mapping columns are kept next to their dotted children, so a record
//! `{"b": {"c": 2}}` yields both `b` (as JSON text) and `b.c`.

mod literal;
mod paths;
mod reader;
mod row;
mod schema;

pub use literal::{expand_value, looks_like_mapping, parse_mapping};
pub use paths::{extend_paths, flatten_paths, resolve_path, PATH_SEPARATOR};
pub use reader::JsonlRecords;
pub use row::{materialize_row, render_value, RowMaterializer};
pub use schema::{discover_schema, ColumnSchema, SchemaBuilder};

#[cfg(test)]
mod tests;
