use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::errors::ReportError;
use crate::types::{ColumnMap, DetailRow, Record};
use crate::util::plain_number;

/// Serialize filtered rows as UTF-8 CSV: a header row from the active
/// column map, then one line per record. Values render locale-free and
/// missing cells stay empty, so the export feeds back through `normalize`
/// unchanged.
pub fn export_csv<W: Write>(
    writer: W,
    columns: &ColumnMap,
    rows: &[Record],
) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(columns.active_columns())?;

    let cell = |v: Option<f64>| v.map(plain_number).unwrap_or_default();
    for r in rows {
        let mut record = vec![
            r.year.to_string(),
            r.month.label().to_string(),
            r.category.clone(),
            cell(r.planned),
            cell(r.actual),
        ];
        if columns.capture_ratio.is_some() {
            record.push(cell(r.capture_ratio));
        }
        if columns.passengers.is_some() {
            record.push(cell(r.passengers));
        }
        if columns.traffic.is_some() {
            record.push(cell(r.traffic));
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_summary_json<T: Serialize, P: AsRef<Path>>(
    path: P,
    value: &T,
) -> Result<(), ReportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn detail_rows(records: &[Record]) -> Vec<DetailRow> {
    records.iter().map(DetailRow::from_record).collect()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
