//! Trace merging.
//!
//! Reads each configured trace file in order, keeps the records whose
//! address falls below the ceiling, and appends them to a single TSV with
//! their line index and source filename. Every failure is fatal: a missing
//! file, a malformed line or an unwritable output aborts the whole run, and
//! rows already written are left in place.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::output::AccessWriter;
use crate::trace::{
    parse_line, AccessRow, ParseError, ADDRESS_CEILING, DEFAULT_OUTPUT_FILE, DEFAULT_TRACES_DIR,
    DEFAULT_TRACE_FILES, LINE_CAP,
};

/// Configuration for a merge run.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Directory the trace files are read from.
    pub traces_dir: PathBuf,
    /// Trace filenames, in output order.
    pub files: Vec<String>,
    /// Path of the merged TSV.
    pub output: PathBuf,
    /// Addresses must be strictly below this to be kept.
    pub address_ceiling: u64,
    /// Reading a file stops after the first line whose index exceeds this.
    pub line_cap: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            traces_dir: PathBuf::from(DEFAULT_TRACES_DIR),
            files: DEFAULT_TRACE_FILES.iter().map(|f| f.to_string()).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            address_ceiling: ADDRESS_CEILING,
            line_cap: LINE_CAP,
        }
    }
}

impl MergeConfig {
    /// Full path of a configured trace file.
    pub fn trace_path(&self, filename: &str) -> PathBuf {
        self.traces_dir.join(filename)
    }
}

/// Per-file counts from a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub filename: String,
    pub lines_read: usize,
    pub rows_accepted: usize,
}

/// Counts for a whole merge run, one entry per input file in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub files: Vec<FileSummary>,
}

impl MergeSummary {
    pub fn total_lines(&self) -> usize {
        self.files.iter().map(|f| f.lines_read).sum()
    }

    pub fn total_accepted(&self) -> usize {
        self.files.iter().map(|f| f.rows_accepted).sum()
    }
}

/// Merge all configured traces into `config.output`.
///
/// The output file is created (or truncated) before any input is opened.
pub fn merge_traces(config: &MergeConfig) -> Result<MergeSummary> {
    let output = File::create(&config.output)
        .with_context(|| format!("Failed to create output file {}", config.output.display()))?;
    tracing::info!("Writing merged accesses to {}", config.output.display());

    let summary = merge_into(config, output)?;
    tracing::info!(
        "Merged {} of {} lines from {} files",
        summary.total_accepted(),
        summary.total_lines(),
        summary.files.len()
    );
    Ok(summary)
}

/// Merge all configured traces into an arbitrary sink.
pub fn merge_into<W: Write>(config: &MergeConfig, sink: W) -> Result<MergeSummary> {
    let mut writer = AccessWriter::new(sink)?;
    let mut summary = MergeSummary::default();

    for filename in &config.files {
        let path = config.trace_path(filename);
        let file_summary = merge_file(&path, filename, config, &mut writer)?;
        tracing::debug!(
            "{}: {} lines read, {} rows accepted",
            filename,
            file_summary.lines_read,
            file_summary.rows_accepted
        );
        summary.files.push(file_summary);
    }

    writer.finish()?;
    Ok(summary)
}

/// Filter a single trace file into `writer`.
///
/// `filename` is what gets recorded in the output's `filename` column;
/// `path` is where the file is actually read from.
pub fn merge_file<W: Write>(
    path: &Path,
    filename: &str,
    config: &MergeConfig,
    writer: &mut AccessWriter<W>,
) -> Result<FileSummary> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open trace file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut summary = FileSummary {
        filename: filename.to_string(),
        ..FileSummary::default()
    };

    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {} line {i}", path.display()))?;
        match parse_line(&line) {
            Ok(record) if record.addr < config.address_ceiling => {
                writer.write_row(&AccessRow::from_record(i, record, filename))?;
                summary.rows_accepted += 1;
            }
            Ok(record) => {
                tracing::trace!("{filename}:{i}: address {:#x} above ceiling", record.addr);
            }
            // Wider than any ceiling
            Err(ParseError::AddressOverflow { token }) => {
                tracing::trace!("{filename}:{i}: address {token} above ceiling");
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Malformed trace line {i} in {}", path.display())));
            }
        }
        summary.lines_read += 1;

        if i > config.line_cap {
            break;
        }
    }

    Ok(summary)
}
