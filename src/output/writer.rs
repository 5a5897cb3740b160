//! Tabular row writers
//!
//! Two sinks share the [`RowWriter`] interface:
//! - CSV: header on open, every row flushed as soon as it is written
//! - Parquet: rows buffered and appended as a row group every `batch_rows`

use super::batch::{rows_to_record_batch, string_schema};
use crate::error::{Error, Result};
use crate::types::{OutputFormat, Row};
use arrow::datatypes::SchemaRef;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Default number of buffered rows per Parquet flush
pub const DEFAULT_BATCH_ROWS: usize = 100_000;

/// A sink for schema-aligned rows
pub trait RowWriter {
    /// Write one row
    fn write_row(&mut self, row: &[String]) -> Result<()>;

    /// Number of rows accepted so far
    fn rows_written(&self) -> usize;

    /// Flush everything and release the output, returning the row count
    fn close(self: Box<Self>) -> Result<usize>;
}

/// Open the writer for an output format
pub fn open_row_writer(
    format: OutputFormat,
    path: impl AsRef<Path>,
    columns: &[String],
    config: &ParquetWriterConfig,
) -> Result<Box<dyn RowWriter>> {
    match format {
        OutputFormat::Csv => Ok(Box::new(CsvRowWriter::create(path, columns)?)),
        OutputFormat::Parquet => Ok(Box::new(ParquetRowWriter::new(path, columns, config))),
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Row-oriented CSV writer
pub struct CsvRowWriter<W: Write> {
    writer: csv::Writer<W>,
    width: usize,
    rows_written: usize,
}

impl CsvRowWriter<File> {
    /// Create (or truncate) a CSV file and write its header
    pub fn create(path: impl AsRef<Path>, columns: &[String]) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(|e| Error::Output {
            message: format!("Failed to create {}: {e}", path.as_ref().display()),
        })?;
        Self::new(file, columns)
    }
}

impl<W: Write> CsvRowWriter<W> {
    /// Wrap a writer and emit the header row
    pub fn new(inner: W, columns: &[String]) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(columns)?;
        writer.flush()?;
        Ok(Self {
            writer,
            width: columns.len(),
            rows_written: 0,
        })
    }

    /// Finish and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::output(format!("Failed to finish CSV output: {}", e.error())))
    }
}

impl<W: Write> RowWriter for CsvRowWriter<W> {
    fn write_row(&mut self, row: &[String]) -> Result<()> {
        check_width(row, self.width)?;
        self.writer.write_record(row)?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn close(mut self: Box<Self>) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }
}

// ============================================================================
// Parquet
// ============================================================================

/// Configuration for the Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    batch_rows: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            batch_rows: DEFAULT_BATCH_ROWS,
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of buffered rows per flush
    #[must_use]
    pub fn with_batch_rows(mut self, rows: usize) -> Self {
        self.batch_rows = rows.max(1);
        self
    }

    /// Rows buffered before each flush
    pub fn batch_rows(&self) -> usize {
        self.batch_rows
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.batch_rows)
            .build()
    }
}

/// Buffered Parquet writer
///
/// The file is created on the first flush; each later flush appends one row
/// group. Closing with no rows still produces a valid, empty file.
pub struct ParquetRowWriter {
    path: PathBuf,
    schema: SchemaRef,
    config: ParquetWriterConfig,
    buffer: Vec<Row>,
    writer: Option<ArrowWriter<File>>,
    rows_written: usize,
    flushes: usize,
}

impl ParquetRowWriter {
    /// Prepare a writer; nothing touches the filesystem until the first flush
    pub fn new(path: impl AsRef<Path>, columns: &[String], config: &ParquetWriterConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema: Arc::new(string_schema(columns)),
            config: config.clone(),
            buffer: Vec::with_capacity(config.batch_rows().min(DEFAULT_BATCH_ROWS)),
            writer: None,
            rows_written: 0,
            flushes: 0,
        }
    }

    /// Rows waiting for the next flush
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Number of row groups appended so far
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    fn open_file(&self) -> Result<ArrowWriter<File>> {
        let file = File::create(&self.path).map_err(|e| Error::Output {
            message: format!("Failed to create {}: {e}", self.path.display()),
        })?;
        let props = self.config.build_properties();
        ArrowWriter::try_new(file, Arc::clone(&self.schema), Some(props)).map_err(|e| {
            Error::Output {
                message: format!("Failed to create Parquet writer: {e}"),
            }
        })
    }

    fn writer(&mut self) -> Result<&mut ArrowWriter<File>> {
        if self.writer.is_none() {
            self.writer = Some(self.open_file()?);
        }
        self.writer
            .as_mut()
            .ok_or_else(|| Error::output("Parquet writer is not open"))
    }

    /// Append buffered rows to the file as one row group
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let batch = rows_to_record_batch(&self.schema, &self.buffer)?;
        let writer = self.writer()?;
        writer.write(&batch).map_err(|e| Error::Output {
            message: format!("Failed to write batch: {e}"),
        })?;
        writer.flush()?;

        self.flushes += 1;
        debug!(
            "Flushed {} rows to {} (row group {})",
            batch.num_rows(),
            self.path.display(),
            self.flushes
        );
        self.buffer.clear();
        Ok(())
    }
}

impl RowWriter for ParquetRowWriter {
    fn write_row(&mut self, row: &[String]) -> Result<()> {
        check_width(row, self.schema.fields().len())?;
        self.buffer.push(row.to_vec());
        self.rows_written += 1;

        if self.buffer.len() >= self.config.batch_rows() {
            self.flush()?;
        }
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn close(mut self: Box<Self>) -> Result<usize> {
        self.flush()?;
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open_file()?,
        };
        writer.close().map_err(|e| Error::Output {
            message: format!("Failed to close Parquet writer: {e}"),
        })?;
        Ok(self.rows_written)
    }
}

fn check_width(row: &[String], width: usize) -> Result<()> {
    if row.len() == width {
        Ok(())
    } else {
        Err(Error::output(format!(
            "Row has {} cells but the header has {width} columns",
            row.len()
        )))
    }
}
