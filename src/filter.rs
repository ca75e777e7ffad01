use crate::types::{AggregateSummary, Dataset, FilterSelection, Record};
use crate::util::average;

/// Apply a selection and compute the summary block in one pass.
///
/// Filtering is a conjunction of membership tests on year, category, and
/// month. Empty selection sets match nothing; "show all" callers build the
/// selection with [`FilterSelection::all_of`]. The returned rows keep the
/// dataset's calendar ordering; the dataset itself is never mutated.
///
/// Undefined aggregates (empty row-set, all ratios missing, zero planned
/// total) come back as `None`, never as a panic or a stray NaN.
pub fn filter_and_summarize(
    dataset: &Dataset,
    selection: &FilterSelection,
) -> (Vec<Record>, AggregateSummary) {
    let rows: Vec<Record> = dataset
        .records()
        .iter()
        .filter(|r| selection.matches(r))
        .cloned()
        .collect();

    let summary = summarize(&rows);
    (rows, summary)
}

/// Aggregates over an already-filtered row-set. Missing planned/actual
/// values count as 0 in the sums; missing ratios are ignored by the mean.
pub fn summarize(rows: &[Record]) -> AggregateSummary {
    let total_planned: f64 = rows.iter().filter_map(|r| r.planned).sum();
    let total_actual: f64 = rows.iter().filter_map(|r| r.actual).sum();

    let ratios: Vec<f64> = rows.iter().filter_map(|r| r.capture_ratio).collect();
    let mean_capture_ratio = if ratios.is_empty() {
        None
    } else {
        Some(average(&ratios))
    };

    let achievement_vs_plan_percent = if total_planned == 0.0 {
        None
    } else {
        Some((total_actual - total_planned) / total_planned * 100.0)
    };

    AggregateSummary {
        row_count: rows.len(),
        total_planned,
        total_actual,
        mean_capture_ratio,
        achievement_vs_plan_percent,
    }
}
