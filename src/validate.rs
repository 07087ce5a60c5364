//! Merged output validation.
//!
//! Re-reads an `accesses.tsv` produced by [`crate::merge_traces`] and checks
//! the guarantees the merger makes: exact header, well-formed rows, addresses
//! under the ceiling, line indices within the cap, rows grouped by file in
//! configured order and ascending index within each group.
//!
//! # Example
//!
//! ```no_run
//! use memtrace::{validate_accesses, MergeConfig};
//! use std::path::Path;
//!
//! let result = validate_accesses(Path::new("accesses.tsv"), &MergeConfig::default());
//! if result.has_errors() {
//!     for error in &result.errors {
//!         eprintln!("Error: {}", error);
//!     }
//! }
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::merge::MergeConfig;
use crate::trace::{ACCESSES_HEADER, FIELD_SEPARATOR};

/// Result of validating a merged output file.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Errors that indicate invalid output.
    pub errors: Vec<ValidationError>,
    /// Warnings that indicate potential issues.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Returns true if there are any validation errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if there are any validation warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Returns true if the output is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// Validation error types.
///
/// `line` is the 1-based line number in the validated file (the header is
/// line 1).
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// The file does not exist.
    MissingFile { path: String },
    /// Failed to read the file.
    ReadError { message: String },
    /// The first line is not the expected header.
    InvalidHeader { got: String },
    /// A row does not have exactly four fields.
    MalformedRow { line: usize, fields: usize },
    /// A column contains an unparsable or out-of-range value.
    InvalidValue {
        line: usize,
        column: &'static str,
        message: String,
    },
    /// A row names a file that is not in the configured list.
    UnknownFile { line: usize, filename: String },
    /// A file's rows appear after rows of a file listed later.
    OutOfOrder { line: usize, filename: String },
    /// Line indices within a file's group do not strictly increase.
    NonIncreasingIndex {
        line: usize,
        filename: String,
        previous: usize,
        index: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingFile { path } => {
                write!(f, "file not found: {path}")
            }
            ValidationError::ReadError { message } => {
                write!(f, "read error: {message}")
            }
            ValidationError::InvalidHeader { got } => {
                write!(
                    f,
                    "line 1: expected header '{}', got '{got}'",
                    ACCESSES_HEADER.join("\\t")
                )
            }
            ValidationError::MalformedRow { line, fields } => {
                write!(f, "line {line}: expected 4 fields, got {fields}")
            }
            ValidationError::InvalidValue {
                line,
                column,
                message,
            } => {
                write!(f, "line {line}: {column}: {message}")
            }
            ValidationError::UnknownFile { line, filename } => {
                write!(f, "line {line}: unknown trace file '{filename}'")
            }
            ValidationError::OutOfOrder { line, filename } => {
                write!(f, "line {line}: rows for '{filename}' are out of file order")
            }
            ValidationError::NonIncreasingIndex {
                line,
                filename,
                previous,
                index,
            } => {
                write!(
                    f,
                    "line {line}: {filename}: index {index} does not follow {previous}"
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validation warning types.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationWarning {
    /// The file holds only the header.
    EmptyOutput,
    /// A configured trace file contributed no rows.
    NoRowsForFile { filename: String },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::EmptyOutput => write!(f, "output has no rows"),
            ValidationWarning::NoRowsForFile { filename } => {
                write!(f, "{filename}: no rows")
            }
        }
    }
}

/// Tracks where we are in the expected file ordering.
struct GroupState {
    position: usize,
    last_index: Option<usize>,
}

/// Validate a merged accesses file against `config`.
///
/// Checks:
/// - Header matches `i rw addr filename`
/// - Each row has four fields with numeric `i` and `addr`
/// - `addr` is below the address ceiling, `i` at most one past the line cap
/// - Rows are grouped by file in configured order, indices ascending
pub fn validate_accesses(path: &Path, config: &MergeConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !path.exists() {
        result.add_error(ValidationError::MissingFile {
            path: path.display().to_string(),
        });
        return result;
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            result.add_error(ValidationError::ReadError {
                message: e.to_string(),
            });
            return result;
        }
    };

    let mut lines = BufReader::new(file).lines();
    match lines.next() {
        Some(Ok(header)) => {
            let sep = FIELD_SEPARATOR.to_string();
            if header != ACCESSES_HEADER.join(sep.as_str()) {
                result.add_error(ValidationError::InvalidHeader { got: header });
            }
        }
        Some(Err(e)) => {
            result.add_error(ValidationError::ReadError {
                message: e.to_string(),
            });
            return result;
        }
        None => {
            result.add_error(ValidationError::InvalidHeader { got: String::new() });
            return result;
        }
    }

    let mut rows_per_file = vec![0usize; config.files.len()];
    let mut state = GroupState {
        position: 0,
        last_index: None,
    };

    for (n, line) in lines.enumerate() {
        let line_no = n + 2;
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                result.add_error(ValidationError::ReadError {
                    message: format!("line {line_no}: {e}"),
                });
                return result;
            }
        };

        if let Some(position) = validate_row(&line, line_no, config, &mut state, &mut result) {
            rows_per_file[position] += 1;
        }
    }

    if rows_per_file.iter().all(|&n| n == 0) {
        result.add_warning(ValidationWarning::EmptyOutput);
    } else {
        for (filename, count) in config.files.iter().zip(&rows_per_file) {
            if *count == 0 {
                result.add_warning(ValidationWarning::NoRowsForFile {
                    filename: filename.clone(),
                });
            }
        }
    }

    result
}

/// Check one data row. Returns the row's file position when it names a
/// configured file.
fn validate_row(
    line: &str,
    line_no: usize,
    config: &MergeConfig,
    state: &mut GroupState,
    result: &mut ValidationResult,
) -> Option<usize> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    let [i, _rw, addr, filename] = fields.as_slice() else {
        result.add_error(ValidationError::MalformedRow {
            line: line_no,
            fields: fields.len(),
        });
        return None;
    };

    let index = match i.parse::<usize>() {
        Ok(index) => {
            if index > config.line_cap.saturating_add(1) {
                result.add_error(ValidationError::InvalidValue {
                    line: line_no,
                    column: "i",
                    message: format!("index {index} is past the line cap {}", config.line_cap),
                });
            }
            Some(index)
        }
        Err(_) => {
            result.add_error(ValidationError::InvalidValue {
                line: line_no,
                column: "i",
                message: format!("'{i}' is not a line index"),
            });
            None
        }
    };

    match addr.parse::<u64>() {
        Ok(value) if value >= config.address_ceiling => {
            result.add_error(ValidationError::InvalidValue {
                line: line_no,
                column: "addr",
                message: format!(
                    "address {value} is not below the ceiling {}",
                    config.address_ceiling
                ),
            });
        }
        Ok(_) => {}
        Err(_) => {
            result.add_error(ValidationError::InvalidValue {
                line: line_no,
                column: "addr",
                message: format!("'{addr}' is not a decimal address"),
            });
        }
    }

    let Some(position) = config.files.iter().position(|f| f == filename) else {
        result.add_error(ValidationError::UnknownFile {
            line: line_no,
            filename: filename.to_string(),
        });
        return None;
    };

    if position < state.position {
        result.add_error(ValidationError::OutOfOrder {
            line: line_no,
            filename: filename.to_string(),
        });
        return Some(position);
    }
    if position > state.position {
        state.position = position;
        state.last_index = None;
    }

    if let Some(index) = index {
        if let Some(previous) = state.last_index {
            if index <= previous {
                result.add_error(ValidationError::NonIncreasingIndex {
                    line: line_no,
                    filename: filename.to_string(),
                    previous,
                    index,
                });
            }
        }
        state.last_index = Some(index);
    }

    Some(position)
}
