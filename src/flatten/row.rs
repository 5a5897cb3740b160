//! Row materialization (pass 2)

use super::literal::expand_value;
use super::paths::resolve_path;
use super::schema::ColumnSchema;
use crate::types::{JsonObject, JsonValue, Row};

/// Extracts schema-aligned rows from records
#[derive(Debug, Clone, Copy)]
pub struct RowMaterializer<'s> {
    schema: &'s ColumnSchema,
    expand: bool,
}

impl<'s> RowMaterializer<'s> {
    /// Create a materializer for a schema
    pub fn new(schema: &'s ColumnSchema, expand: bool) -> Self {
        Self { schema, expand }
    }

    /// Materialize one record; the row always has one cell per column
    pub fn materialize(&self, record: &JsonObject) -> Row {
        materialize_row(record, self.schema.columns(), self.expand)
    }
}

/// Materialize a record against an explicit column list
pub fn materialize_row(record: &JsonObject, columns: &[String], expand: bool) -> Row {
    columns
        .iter()
        .map(|column| match resolve_path(record, column) {
            Some(value) if expand => render_value(&expand_value(value)),
            Some(value) => render_value(value),
            None => String::new(),
        })
        .collect()
}

/// Render one cell
///
/// Mappings and lists become compact JSON text and strings are written raw.
/// Numbers use their JSON spelling, booleans are `True`/`False`, null is empty.
pub fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(true) => "True".to_string(),
        JsonValue::Bool(false) => "False".to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
    }
}
