//! Trace data model structs.

use std::str::FromStr;

use super::parser::ParseError;

/// A single parsed trace line.
///
/// # Fields
/// - `rw`: Access kind token, kept verbatim (e.g. "R", "W", "r", "w")
/// - `addr`: Memory address, parsed from hexadecimal text
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TraceRecord {
    pub rw: String,
    pub addr: u64,
}

/// A row of the merged output.
///
/// # Fields
/// - `i`: 0-based line index within the source file
/// - `rw`: Access kind token from the source line
/// - `addr`: Decimal address value
/// - `filename`: Source filename as listed in the configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessRow {
    pub i: usize,
    pub rw: String,
    pub addr: u64,
    pub filename: String,
}

impl AccessRow {
    pub fn from_record(i: usize, record: TraceRecord, filename: &str) -> Self {
        Self {
            i,
            rw: record.rw,
            addr: record.addr,
            filename: filename.to_string(),
        }
    }
}

/// Interpreted form of a trace record's `rw` token.
///
/// The merger keeps `rw` verbatim; only the cache simulator needs to know
/// whether an access reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
}

impl FromStr for AccessKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" | "R" => Ok(AccessKind::Read),
            "w" | "W" => Ok(AccessKind::Write),
            _ => Err(ParseError::UnknownAccessKind {
                token: s.to_string(),
            }),
        }
    }
}
