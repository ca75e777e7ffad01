//! Reporting core for RKAP (planned) vs Achievement (actual) dashboards.
//!
//! The crate turns a spreadsheet export of planned-versus-actual business
//! metrics, grouped by year, month, and category, into filtered row-sets
//! and simple aggregates for a presentation layer. The heart of it is the
//! normalization pipeline in [`normalize`]; filtering and aggregation live
//! in [`filter`]; file reading and CSV/JSON output are thin collaborators
//! around them.

pub mod cache;
pub mod errors;
pub mod filter;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod types;
pub mod util;

pub use cache::DatasetCache;
pub use errors::{ReportError, SchemaError};
pub use filter::{filter_and_summarize, summarize};
pub use loader::{read_table, read_table_from_reader, RawTable};
pub use normalize::{normalize, NormalizeReport};
pub use output::{detail_rows, export_csv, write_summary_json};
pub use types::{
    AggregateSummary, ColumnMap, Dataset, DetailRow, FilterSelection, Month, MonthKey, Record,
};
