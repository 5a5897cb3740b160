//! Flatten run: JSON Lines inputs to CSV or Parquet outputs

use crate::config::FlattenConfig;
use crate::error::{Result, ResultExt};
use crate::flatten::{discover_schema, ColumnSchema, JsonlRecords, RowMaterializer};
use crate::output::{open_row_writer, ParquetWriterConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// One converted input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
}

/// Summary of a flatten run
#[derive(Debug, Clone, Default)]
pub struct FlattenReport {
    /// Shared column schema of every output
    pub columns: Vec<String>,
    pub files: Vec<FileReport>,
    pub duration_ms: u64,
}

impl FlattenReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }
}

/// Flatten every input matched by the config
///
/// Pass 1 discovers one schema across all inputs. Pass 2 writes each input
/// to its own output using that schema, so every output has the same header.
pub fn run_flatten(config: &FlattenConfig) -> Result<FlattenReport> {
    let start = Instant::now();
    config.validate()?;
    let inputs = config.resolve_inputs()?;
    config.validate_inputs(&inputs)?;

    let schema = discover_schema(&inputs, config.expand_dicts)?;
    info!("Discovered {} columns", schema.len());

    let writer_config = ParquetWriterConfig::default().with_batch_rows(config.batch_rows);
    let mut files = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let output = config.output_path_for(input);
        info!("Converting {} -> {}", display_name(input), display_name(&output));

        let rows = flatten_file(input, &output, &schema, config, &writer_config)?;
        info!("{} written ({} rows)", display_name(&output), rows);
        files.push(FileReport {
            input: input.clone(),
            output,
            rows,
        });
    }

    let report = FlattenReport {
        columns: schema.columns().to_vec(),
        files,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion finished: {} files, {} rows in {}ms",
        report.files.len(),
        report.total_rows(),
        report.duration_ms
    );
    Ok(report)
}

/// Write the flattened rows of one input; returns the row count
pub fn flatten_file(
    input: &Path,
    output: &Path,
    schema: &ColumnSchema,
    config: &FlattenConfig,
    writer_config: &ParquetWriterConfig,
) -> Result<usize> {
    let materializer = RowMaterializer::new(schema, config.expand_dicts);
    let mut writer = open_row_writer(config.format, output, schema.columns(), writer_config)
        .with_context(|| format!("Failed to open output {}", output.display()))?;

    for record in JsonlRecords::open(input)? {
        let row = materializer.materialize(&record?);
        writer.write_row(&row)?;
    }

    let rows = writer.close()?;
    debug!("Closed writer for {}", output.display());
    Ok(rows)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}
