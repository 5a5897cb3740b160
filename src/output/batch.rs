//! Row buffers to Arrow RecordBatches and back
//!
//! Flattened rows are all text, so every column is `Utf8`.

use crate::error::{Error, Result};
use crate::types::Row;
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Build an all-`Utf8` Arrow schema for a column list
pub fn string_schema(columns: &[String]) -> Schema {
    let fields: Vec<Field> = columns
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, false))
        .collect();
    Schema::new(fields)
}

/// Convert buffered rows into a RecordBatch
///
/// Every row must have exactly one cell per schema field.
pub fn rows_to_record_batch(schema: &SchemaRef, rows: &[Row]) -> Result<RecordBatch> {
    let width = schema.fields().len();
    if let Some(bad) = rows.iter().find(|row| row.len() != width) {
        return Err(Error::output(format!(
            "Row has {} cells but schema has {} columns",
            bad.len(),
            width
        )));
    }

    let columns: Vec<ArrayRef> = (0..width)
        .map(|idx| {
            let array = StringArray::from_iter_values(rows.iter().map(|row| row[idx].as_str()));
            Arc::new(array) as ArrayRef
        })
        .collect();

    // Row count is explicit so a schema without columns still works
    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    RecordBatch::try_new_with_options(Arc::clone(schema), columns, &options).map_err(|e| {
        Error::Output {
            message: format!("Failed to create RecordBatch: {e}"),
        }
    })
}

/// Convert a RecordBatch of string columns back into rows
///
/// Null cells become empty strings.
pub fn record_batch_to_rows(batch: &RecordBatch) -> Result<Vec<Row>> {
    let columns: Vec<&StringArray> = batch
        .columns()
        .iter()
        .map(|column| {
            column
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::Output {
                    message: format!("Expected a Utf8 column, found {}", column.data_type()),
                })
        })
        .collect::<Result<_>>()?;

    let rows = (0..batch.num_rows())
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    if column.is_null(row) {
                        String::new()
                    } else {
                        column.value(row).to_string()
                    }
                })
                .collect()
        })
        .collect();

    Ok(rows)
}

/// Read a flattened Parquet file back into its header and rows
pub fn read_parquet_rows(path: impl AsRef<Path>) -> Result<(Vec<String>, Vec<Row>)> {
    let file = File::open(path.as_ref())?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let header = builder
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect();

    let mut rows = Vec::new();
    for batch in builder.build()? {
        rows.extend(record_batch_to_rows(&batch?)?);
    }
    Ok((header, rows))
}
