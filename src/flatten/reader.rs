//! Line-delimited JSON record reader
//!
//! Streams one JSON object per line from a file. Blank lines are skipped;
//! a line that is not a JSON object aborts the run.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Iterator over the records of a JSON Lines file
pub struct JsonlRecords<R> {
    lines: Lines<R>,
    source: String,
    line_no: usize,
}

impl JsonlRecords<BufReader<File>> {
    /// Open a JSON Lines file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::new(
            BufReader::new(file),
            path.display().to_string(),
        ))
    }
}

impl<R: BufRead> JsonlRecords<R> {
    /// Wrap any buffered reader; `source` names it in error messages
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            source: source.into(),
            line_no: 0,
        }
    }

    fn parse_line(&self, line: &str) -> Result<JsonObject> {
        match serde_json::from_str::<JsonValue>(line) {
            Ok(JsonValue::Object(map)) => Ok(map),
            Ok(other) => Err(Error::decode(
                &self.source,
                self.line_no,
                format!("expected a JSON object, found {}", json_kind(&other)),
            )),
            Err(e) => Err(Error::decode(&self.source, self.line_no, e.to_string())),
        }
    }
}

impl<R: BufRead> Iterator for JsonlRecords<R> {
    type Item = Result<JsonObject>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Some(self.parse_line(trimmed));
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
