//! In-memory review tables and chunked CSV reading
//!
//! A [`Frame`] is a small column-named table whose cells are nullable
//! strings. Review CSVs are read a bounded number of rows at a time so that
//! multi-gigabyte inputs never have to fit in memory.

use crate::error::{Error, Result};
use crate::types::NullableRow;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Default number of rows per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// A table of nullable string cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<NullableRow>,
}

impl Frame {
    /// Create an empty frame with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a frame from columns and rows, checking row widths
    pub fn from_rows<I, S>(columns: I, rows: Vec<NullableRow>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut frame = Self::new(columns);
        for row in rows {
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[NullableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Whether a column exists and holds at least one non-null cell
    pub fn column_has_values(&self, name: &str) -> bool {
        self.column_index(name)
            .is_some_and(|idx| self.rows.iter().any(|row| row[idx].is_some()))
    }

    /// Cell value by row position and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// All cells of a column, or `None` if the column is absent
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    /// Append a row; its width must match the columns
    pub fn push_row(&mut self, row: NullableRow) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Other(format!(
                "Row has {} cells but frame has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Keep only rows matching a predicate, preserving order
    #[must_use]
    pub fn retain_rows<F>(mut self, mut keep: F) -> Self
    where
        F: FnMut(&[Option<String>]) -> bool,
    {
        self.rows.retain(|row| keep(row));
        self
    }

    /// Keep only rows whose cell in `column` matches a predicate
    ///
    /// A frame without the column is returned unchanged.
    #[must_use]
    pub fn filter_column<F>(self, column: &str, mut keep: F) -> Self
    where
        F: FnMut(Option<&str>) -> bool,
    {
        match self.column_index(column) {
            Some(idx) => self.retain_rows(|row| keep(row[idx].as_deref())),
            None => self,
        }
    }

    /// Restrict to the named columns that exist, in the order given
    #[must_use]
    pub fn select(self, names: &[&str]) -> Self {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();

        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Self { columns, rows }
    }

    /// Add a column, or replace it if a column with that name exists
    pub fn set_column(&mut self, name: &str, values: Vec<Option<String>>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::Other(format!(
                "Column '{name}' has {} values but frame has {} rows",
                values.len(),
                self.rows.len()
            )));
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Append the rows of another frame with identical columns
    pub fn append(&mut self, other: Frame) -> Result<()> {
        if other.columns != self.columns {
            return Err(Error::Other(format!(
                "Cannot append frame with columns {:?} to frame with columns {:?}",
                other.columns, self.columns
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Write the frame as CSV; null cells are written empty
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the frame to a CSV file, creating parent directories
    pub fn write_csv_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path).map_err(|e| Error::Output {
            message: format!("Failed to create {}: {e}", path.display()),
        })?;
        self.write_csv(file)
    }
}

// ============================================================================
// Chunked CSV reader
// ============================================================================

/// Reads a headed CSV table as a sequence of bounded frames
pub struct ChunkReader<R: Read> {
    reader: csv::Reader<R>,
    columns: Vec<String>,
    chunk_size: usize,
    rows_read: usize,
    done: bool,
}

impl ChunkReader<File> {
    /// Open a CSV file for chunked reading
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open {}: {e}", path.display()),
            ))
        })?;
        Self::new(file, chunk_size)
    }
}

impl<R: Read> ChunkReader<R> {
    /// Wrap a reader; the first record is the header
    pub fn new(reader: R, chunk_size: usize) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let columns = reader.headers()?.iter().map(ToString::to_string).collect();

        Ok(Self {
            reader,
            columns,
            chunk_size: chunk_size.max(1),
            rows_read: 0,
            done: false,
        })
    }

    /// Header of the table
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Total data rows read so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    fn read_chunk(&mut self) -> Result<Option<Frame>> {
        let mut frame = Frame::new(self.columns.clone());
        let mut record = csv::StringRecord::new();

        while frame.len() < self.chunk_size {
            if !self.reader.read_record(&mut record)? {
                self.done = true;
                break;
            }
            let row = record
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect();
            frame.push_row(row)?;
        }

        self.rows_read += frame.len();
        Ok((!frame.is_empty()).then_some(frame))
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
