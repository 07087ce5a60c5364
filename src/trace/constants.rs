//! Shared constants for trace processing.
//!
//! The defaults reproduce the fixed benchmark setup the traces were collected
//! with. They are overridable through [`crate::MergeConfig`].

/// Directory, relative to the working directory, holding the input traces.
pub const DEFAULT_TRACES_DIR: &str = "traces";

/// Input traces, in the order their rows appear in the merged output.
pub const DEFAULT_TRACE_FILES: [&str; 4] = [
    "astar.trace",
    "bzip2.trace",
    "mcf.trace",
    "perlbench.trace",
];

/// Merged output file, relative to the working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "accesses.tsv";

/// Addresses must be strictly below this value to be kept (2^30).
pub const ADDRESS_CEILING: u64 = 1 << 30;

/// A file stops being read after the first line whose index exceeds this.
/// Indices 0 through `LINE_CAP + 1` are therefore considered.
pub const LINE_CAP: usize = 100_000;

/// Column names of the merged output, in order.
pub const ACCESSES_HEADER: [&str; 4] = ["i", "rw", "addr", "filename"];

/// Field separator of the merged output.
pub const FIELD_SEPARATOR: char = '\t';
