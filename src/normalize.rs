use std::collections::HashMap;

use crate::errors::SchemaError;
use crate::loader::RawTable;
use crate::types::{ColumnMap, Dataset, MonthKey, Record};
use crate::util::{average, parse_f64_safe, parse_i32_safe, parse_ratio_safe};

/// Diagnostics from one normalization pass.
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Rows dropped for missing year/month/category.
    pub dropped_missing_keys: usize,
    /// Kept rows whose month text matched no calendar member.
    pub unmatched_months: usize,
    /// Whether the fraction-vs-percent heuristic rescaled the ratio column.
    pub ratio_rescaled: bool,
}

/// Clean and coerce raw rows into an immutable [`Dataset`].
///
/// Pipeline order is fixed:
/// 1. required-column check against trimmed headers (single aggregated
///    [`SchemaError`] listing every missing column; nothing else runs),
/// 2. drop rows missing year, month, or category,
/// 3. map month text onto the calendar (unmatched labels are kept and sort
///    after December),
/// 4. coerce the capture ratio (`%` suffix, comma decimals) and the plain
///    numeric columns; unparsable cells become `None`, never zero,
/// 5. rescale the ratio column ×100 when its mean is below 1.0,
/// 6. stable sort by calendar slot.
///
/// The ratio rescale is dataset-global: a column accidentally mixing
/// fraction-scale and percent-scale rows is normalized incorrectly. Known
/// limitation, kept for compatibility with the source dashboards.
///
/// No I/O happens here; file reading lives in [`crate::loader`].
pub fn normalize(
    table: &RawTable,
    columns: &ColumnMap,
    required_columns: &[String],
) -> Result<(Dataset, NormalizeReport), SchemaError> {
    // Header lookup by trimmed name; first occurrence wins.
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, header) in table.headers.iter().enumerate() {
        index.entry(header.trim()).or_insert(i);
    }

    let missing: Vec<String> = required_columns
        .iter()
        .filter(|c| !index.contains_key(c.trim()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError { missing });
    }

    let col = |name: &str| index.get(name.trim()).copied();
    let opt_col = |name: &Option<String>| name.as_deref().and_then(col);

    // Required columns resolved above; these lookups cannot miss when the
    // caller's required list covers the core five (the default does).
    let year_idx = col(&columns.year);
    let month_idx = col(&columns.month);
    let category_idx = col(&columns.category);
    let planned_idx = col(&columns.planned);
    let actual_idx = col(&columns.actual);
    let ratio_idx = opt_col(&columns.capture_ratio);
    let pax_idx = opt_col(&columns.passengers);
    let traffic_idx = opt_col(&columns.traffic);

    let mut report = NormalizeReport {
        total_rows: table.rows.len(),
        ..NormalizeReport::default()
    };
    let mut records: Vec<Record> = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let cell = |idx: Option<usize>| idx.and_then(|i| RawTable::cell(row, i));

        // Identifying dimensions; a row we cannot place on any axis is
        // dropped. An unparsable year counts as missing.
        let year = match parse_i32_safe(cell(year_idx)) {
            Some(y) => y,
            None => {
                report.dropped_missing_keys += 1;
                continue;
            }
        };
        let month_raw = match cell(month_idx).map(str::trim) {
            Some(m) if !m.is_empty() => m,
            _ => {
                report.dropped_missing_keys += 1;
                continue;
            }
        };
        let category = match cell(category_idx).map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => {
                report.dropped_missing_keys += 1;
                continue;
            }
        };

        let month = MonthKey::from_raw(month_raw);
        if matches!(month, MonthKey::Unrecognized(_)) {
            report.unmatched_months += 1;
            log::debug!("unmatched month label kept as trailing: {:?}", month_raw);
        }

        records.push(Record {
            year,
            month,
            category,
            planned: parse_f64_safe(cell(planned_idx)),
            actual: parse_f64_safe(cell(actual_idx)),
            capture_ratio: parse_ratio_safe(cell(ratio_idx)),
            passengers: parse_f64_safe(cell(pax_idx)),
            traffic: parse_f64_safe(cell(traffic_idx)),
        });
    }

    rescale_fraction_ratios(&mut records, &mut report);

    // Calendar ordering; stable, so input order survives within a month.
    records.sort_by_key(|r| r.month.slot());

    report.kept_rows = records.len();
    if report.dropped_missing_keys > 0 {
        log::info!(
            "dropped {} of {} rows missing year/month/category",
            report.dropped_missing_keys,
            report.total_rows
        );
    }

    Ok((Dataset::new(records), report))
}

/// Fraction-vs-percent auto-detection: when the column mean of the
/// non-missing ratios sits below 1.0 the data was almost certainly encoded
/// as fractions (0.45 instead of 45), so the whole column is scaled ×100.
fn rescale_fraction_ratios(records: &mut [Record], report: &mut NormalizeReport) {
    let present: Vec<f64> = records.iter().filter_map(|r| r.capture_ratio).collect();
    if present.is_empty() {
        return;
    }
    let mean = average(&present);
    if mean < 1.0 {
        for r in records.iter_mut() {
            if let Some(v) = r.capture_ratio.as_mut() {
                *v *= 100.0;
            }
        }
        report.ratio_rescaled = true;
        log::info!(
            "capture ratio column mean {:.4} < 1; rescaled {} values to percent",
            mean,
            present.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Month;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn default_required() -> Vec<String> {
        ColumnMap::default().required_columns()
    }

    const HEADERS: &[&str] = &[
        "Tahun",
        "Bulan",
        "Kategori",
        "RKAP",
        "Achievement",
        "Capture Ratio",
        "PAX",
        "Traffic",
    ];

    #[test]
    fn normalizes_percent_string_and_month_label() {
        // Scenario: "jan" lands in the first calendar slot, "45%" becomes 45.0.
        let t = table(
            HEADERS,
            &[&["2024", "jan", "A", "100", "120", "45%", "10", "20"]],
        );
        let (ds, report) = normalize(&t, &ColumnMap::default(), &default_required()).unwrap();
        assert_eq!(ds.len(), 1);
        let r = &ds.records()[0];
        assert_eq!(r.year, 2024);
        assert_eq!(r.month, MonthKey::Calendar(Month::January));
        assert_eq!(r.capture_ratio, Some(45.0));
        assert_eq!(r.planned, Some(100.0));
        assert_eq!(r.actual, Some(120.0));
        assert!(!report.ratio_rescaled);
    }

    #[test]
    fn rescales_fraction_encoded_ratio_column() {
        let t = table(
            HEADERS,
            &[
                &["2024", "jan", "A", "1", "1", "0.4", "", ""],
                &["2024", "feb", "A", "1", "1", "0.5", "", ""],
                &["2024", "mar", "A", "1", "1", "0.6", "", ""],
            ],
        );
        let (ds, report) = normalize(&t, &ColumnMap::default(), &default_required()).unwrap();
        let ratios: Vec<f64> = ds.records().iter().filter_map(|r| r.capture_ratio).collect();
        assert_eq!(ratios, vec![40.0, 50.0, 60.0]);
        assert!(report.ratio_rescaled);
    }

    #[test]
    fn leaves_percent_scale_column_alone_even_when_mixed() {
        // Documented limitation: the trigger is the column mean, so one
        // percent-scale value keeps genuine fractions unscaled.
        let t = table(
            HEADERS,
            &[
                &["2024", "jan", "A", "1", "1", "0.5", "", ""],
                &["2024", "feb", "A", "1", "1", "80", "", ""],
            ],
        );
        let (ds, report) = normalize(&t, &ColumnMap::default(), &default_required()).unwrap();
        let ratios: Vec<f64> = ds.records().iter().filter_map(|r| r.capture_ratio).collect();
        assert_eq!(ratios, vec![0.5, 80.0]);
        assert!(!report.ratio_rescaled);
    }

    #[test]
    fn reports_every_missing_required_column_at_once() {
        let t = table(
            &["Tahun", "Bulan", "Kategori", "RKAP", "Achievement", "Capture Ratio"],
            &[],
        );
        let err = normalize(&t, &ColumnMap::default(), &default_required()).unwrap_err();
        assert_eq!(err.missing, vec!["PAX".to_string(), "Traffic".to_string()]);
    }

    #[test]
    fn missing_single_column_lists_exactly_that_column() {
        let t = table(
            &["Tahun", "Bulan", "Kategori", "RKAP", "Achievement", "Capture Ratio", "PAX"],
            &[],
        );
        let err = normalize(&t, &ColumnMap::default(), &default_required()).unwrap_err();
        assert_eq!(err.missing, vec!["Traffic".to_string()]);
        assert_eq!(err.to_string(), "missing required columns: Traffic");
    }

    #[test]
    fn trims_whitespace_in_header_names() {
        let t = table(
            &[" Tahun ", "Bulan", "Kategori", "RKAP ", "Achievement", "Capture Ratio", "PAX", " Traffic"],
            &[&["2024", "jan", "A", "100", "120", "45%", "10", "20"]],
        );
        let (ds, _) = normalize(&t, &ColumnMap::default(), &default_required()).unwrap();
        assert_eq!(ds.records()[0].planned, Some(100.0));
        assert_eq!(ds.records()[0].traffic, Some(20.0));
    }

    #[test]
    fn drops_rows_missing_identifying_keys() {
        let t = table(
            HEADERS,
            &[
                &["2024", "jan", "A", "1", "1", "50", "", ""],
                &["", "jan", "A", "1", "1", "50", "", ""],
                &["2024", "", "A", "1", "1", "50", "", ""],
                &["2024", "jan", "", "1", "1", "50", "", ""],
                &["dua ribu", "jan", "A", "1", "1", "50", "", ""],
            ],
        );
        let (ds, report) = normalize(&t, &ColumnMap::default(), &default_required()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(report.total_rows, 5);
        assert_eq!(report.dropped_missing_keys, 4);
        assert_eq!(report.kept_rows, 1);
    }

    #[test]
    fn unmatched_months_are_kept_and_sort_last() {
        let t = table(
            HEADERS,
            &[
                &["2024", "Kuartal X", "A", "1", "1", "50", "", ""],
                &["2024", "des", "A", "1", "1", "50", "", ""],
                &["2024", "jan", "A", "1", "1", "50", "", ""],
            ],
        );
        let (ds, report) = normalize(&t, &ColumnMap::default(), &default_required()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(report.unmatched_months, 1);
        let labels: Vec<&str> = ds.records().iter().map(|r| r.month.label()).collect();
        assert_eq!(labels, vec!["Januari", "Desember", "Kuartal X"]);
    }

    #[test]
    fn unparsable_numerics_become_missing_not_zero() {
        let t = table(
            HEADERS,
            &[&["2024", "jan", "A", "n/a", "", "oops", "x", "1,500"]],
        );
        let (ds, _) = normalize(&t, &ColumnMap::default(), &default_required()).unwrap();
        let r = &ds.records()[0];
        assert_eq!(r.planned, None);
        assert_eq!(r.actual, None);
        assert_eq!(r.capture_ratio, None);
        assert_eq!(r.passengers, None);
        assert_eq!(r.traffic, Some(1500.0));
    }

    #[test]
    fn stable_sort_keeps_input_order_within_a_month() {
        let t = table(
            HEADERS,
            &[
                &["2025", "feb", "B", "1", "1", "50", "", ""],
                &["2024", "jan", "Z", "1", "1", "50", "", ""],
                &["2024", "jan", "A", "1", "1", "50", "", ""],
            ],
        );
        let (ds, _) = normalize(&t, &ColumnMap::default(), &default_required()).unwrap();
        let cats: Vec<&str> = ds.records().iter().map(|r| r.category.as_str()).collect();
        assert_eq!(cats, vec!["Z", "A", "B"]);
    }

    #[test]
    fn normalizing_normalized_values_is_stable() {
        // Round-trip stability of month/ratio coercion: feeding the cleaned
        // values back through yields the same dataset.
        let t = table(
            HEADERS,
            &[
                &["2024", "Januari", "A", "100", "120", "45", "10", "20"],
                &["2024", "Februari", "B", "200", "150", "72.5", "30", "40"],
            ],
        );
        let columns = ColumnMap::default();
        let required = default_required();
        let (first, _) = normalize(&t, &columns, &required).unwrap();

        let rows: Vec<Vec<String>> = first
            .records()
            .iter()
            .map(|r| {
                vec![
                    r.year.to_string(),
                    r.month.label().to_string(),
                    r.category.clone(),
                    r.planned.map(|v| v.to_string()).unwrap_or_default(),
                    r.actual.map(|v| v.to_string()).unwrap_or_default(),
                    r.capture_ratio.map(|v| v.to_string()).unwrap_or_default(),
                    r.passengers.map(|v| v.to_string()).unwrap_or_default(),
                    r.traffic.map(|v| v.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        let round_trip = RawTable {
            headers: HEADERS.iter().map(|h| h.to_string()).collect(),
            rows,
        };
        let (second, _) = normalize(&round_trip, &columns, &required).unwrap();
        assert_eq!(first.records(), second.records());
    }
}
