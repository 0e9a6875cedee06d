//! Low-level CSV I/O (spec §4.5.2, §6.4): a single-byte delimited writer
//! for raw extraction output, plus the read-back helpers the parsed
//! projection pass and WHERE-clause construction use.
//!
//! Buffering follows the teacher's `writer::TableWriter` — one
//! `BufWriter<File>` per table, opened and closed per table rather than
//! held open for the run (spec §5: "one file handle per table being
//! written... no long-lived handles").

use crate::error::SliceError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// ASCII group-separator — the field delimiter used throughout (spec §6.4).
pub const DELIMITER: u8 = 0x1D;

/// Buffer size per table file, matching the teacher's `WRITER_BUFFER_SIZE`.
const WRITER_BUFFER_SIZE: usize = 256 * 1024;

/// Streaming writer for one table's raw extraction file.
pub struct CsvWriter {
    writer: BufWriter<File>,
    rows_written: usize,
}

impl CsvWriter {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::with_capacity(WRITER_BUFFER_SIZE, file),
            rows_written: 0,
        })
    }

    /// Write one row, stripping embedded newlines from each cell and
    /// joining with [`DELIMITER`].
    pub fn write_row<I, S>(&mut self, fields: I) -> std::io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut first = true;
        for field in fields {
            if !first {
                self.writer.write_all(&[DELIMITER])?;
            }
            first = false;
            for ch in field.as_ref().chars() {
                if ch != '\n' && ch != '\r' {
                    write!(self.writer, "{ch}")?;
                }
            }
        }
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn finish(mut self) -> std::io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }
}

/// Parse one delimited line into its fields, without the trailing newline.
pub fn split_row(line: &str) -> Vec<&str> {
    line.split(DELIMITER as char).collect()
}

/// Re-read a raw CSV and write the projected subset of columns as a
/// header + data CSV (spec §4.5.2 step 4), using the same delimiter.
///
/// `column_names` gives the full ordered header of the raw file (the
/// order columns were selected in by `SELECT *`); `needed` names the
/// subset (and order) to keep. Returns `Ok(None)` when `needed` is empty
/// or the raw file has zero rows — callers skip writing `_parsed.csv` in
/// either case (spec §8.1 "Projection completeness", §8.4 scenario 4).
///
/// Returns [`SliceError::Invariant`] if a needed column is missing from
/// `column_names` — the raw header disagreeing with the FK column map
/// built during discovery is a broken invariant, not a condition a
/// caller can recover from (spec §7).
pub fn write_parsed_projection(
    raw_path: &Path,
    parsed_path: &Path,
    column_names: &[String],
    needed: &[String],
) -> Result<Option<usize>, SliceError> {
    if needed.is_empty() {
        return Ok(None);
    }

    let indices: Vec<usize> = needed
        .iter()
        .map(|name| {
            column_names.iter().position(|c| c == name).ok_or_else(|| {
                SliceError::Invariant(format!("needed column '{name}' missing from raw header"))
            })
        })
        .collect::<Result<_, _>>()?;

    let raw = File::open(raw_path)?;
    let reader = BufReader::new(raw);

    let mut out = CsvWriter::create(parsed_path)?;
    out.write_row(needed)?;

    let mut row_count = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let fields = split_row(&line);
        let projected: Vec<&str> = indices.iter().map(|&i| fields[i]).collect();
        out.write_row(projected)?;
        row_count += 1;
    }

    if row_count == 0 {
        std::fs::remove_file(parsed_path)?;
        return Ok(None);
    }

    out.finish()?;
    Ok(Some(row_count))
}

/// Read every non-empty (non-NULL) value of `column` out of a previously
/// written `_parsed.csv`, for use as `IN (…)` seed values (spec §4.5.1).
/// Returns an empty vec if the file does not exist (that parent/dependant
/// yielded zero rows, per §4.5.1 "that disjunct is omitted").
pub fn read_parsed_column(path: &Path, column: &str) -> std::io::Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header_line = String::new();
    reader.read_line(&mut header_line)?;
    let header: Vec<&str> = split_row(header_line.trim_end_matches('\n'));
    let index = match header.iter().position(|c| *c == column) {
        Some(i) => i,
        None => return Ok(Vec::new()),
    };

    let mut values = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let fields = split_row(&line);
        if let Some(value) = fields.get(index) {
            if !value.is_empty() {
                values.push((*value).to_string());
            }
        }
    }
    Ok(values)
}
