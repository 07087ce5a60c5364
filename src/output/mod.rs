//! Merged output writer.
//!
//! Rows are written as tab-separated text with a fixed header line. The
//! writer owns a buffered handle to its sink; dropping it releases the
//! handle on every path, and [`AccessWriter::finish`] flushes explicitly so
//! write errors surface instead of being lost in `Drop`.

use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

use crate::trace::{AccessRow, ACCESSES_HEADER, FIELD_SEPARATOR};

/// Buffered TSV writer for [`AccessRow`]s.
pub struct AccessWriter<W: Write> {
    inner: BufWriter<W>,
}

impl<W: Write> AccessWriter<W> {
    /// Wrap `sink` and write the header line.
    pub fn new(sink: W) -> Result<Self> {
        let mut inner = BufWriter::new(sink);
        let sep = FIELD_SEPARATOR.to_string();
        writeln!(inner, "{}", ACCESSES_HEADER.join(sep.as_str()))
            .context("Failed to write header")?;
        Ok(Self { inner })
    }

    /// Append one row.
    pub fn write_row(&mut self, row: &AccessRow) -> Result<()> {
        writeln!(
            self.inner,
            "{i}{sep}{rw}{sep}{addr}{sep}{filename}",
            i = row.i,
            rw = row.rw,
            addr = row.addr,
            filename = row.filename,
            sep = FIELD_SEPARATOR,
        )
        .context("Failed to write row")
    }

    /// Flush buffered rows and hand back the underlying sink.
    pub fn finish(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| e.into_error())
            .context("Failed to flush output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(i: usize, rw: &str, addr: u64, filename: &str) -> AccessRow {
        AccessRow {
            i,
            rw: rw.to_string(),
            addr,
            filename: filename.to_string(),
        }
    }

    #[test]
    fn test_header_only() {
        let writer = AccessWriter::new(Vec::new()).unwrap();
        let out = writer.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "i\trw\taddr\tfilename\n");
    }

    #[test]
    fn test_rows_follow_header() {
        let mut writer = AccessWriter::new(Vec::new()).unwrap();
        writer.write_row(&row(0, "R", 1000, "astar.trace")).unwrap();
        writer.write_row(&row(7, "W", 42, "mcf.trace")).unwrap();

        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            "i\trw\taddr\tfilename\n0\tR\t1000\tastar.trace\n7\tW\t42\tmcf.trace\n"
        );
    }
}
