//! Output module
//!
//! Writes flattened rows to CSV or Parquet.
//!
//! # Overview
//!
//! This module provides:
//! - A [`RowWriter`] trait with CSV and Parquet implementations
//! - Conversion of text rows to Arrow RecordBatches and back
//! - Reading a written Parquet file back into rows

mod batch;
mod writer;

pub use batch::{read_parquet_rows, record_batch_to_rows, rows_to_record_batch, string_schema};
pub use writer::{
    open_row_writer, CsvRowWriter, ParquetRowWriter, ParquetWriterConfig, RowWriter,
    DEFAULT_BATCH_ROWS,
};
