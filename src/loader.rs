use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::errors::ReportError;

/// Raw tabular input exactly as read from the file: header names untrimmed,
/// every cell still a string. All cleaning happens later in `normalize`.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Cell at `col` for a row, `None` when the (flexible-width) row is
    /// shorter than the header.
    pub fn cell<'a>(row: &'a [String], col: usize) -> Option<&'a str> {
        row.get(col).map(|s| s.as_str())
    }
}

/// Read a CSV file from disk. I/O only; no validation beyond well-formed
/// CSV framing.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<RawTable, ReportError> {
    let file = File::open(path)?;
    read_table_from_reader(file)
}

/// Read CSV from any reader. Uploaded byte buffers come through here so
/// fixed-file and upload flows share one code path.
pub fn read_table_from_reader<R: Read>(reader: R) -> Result<RawTable, ReportError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(RawTable { headers, rows })
}
