use std::collections::{BTreeSet, HashSet};
use std::hash::{Hash, Hasher};

use serde::Serialize;
use tabled::Tabled;

use crate::util::format_number;

/// Fixed calendar enumeration, January first. The discriminant doubles as
/// the sort slot (1..=12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    January = 1,
    February = 2,
    March = 3,
    April = 4,
    May = 5,
    June = 6,
    July = 7,
    August = 8,
    September = 9,
    October = 10,
    November = 11,
    December = 12,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Month> {
        Month::ALL.get(n.checked_sub(1)? as usize).copied()
    }

    /// Canonical display label. The source exports use Indonesian month
    /// names, so that is what we render back out.
    pub fn label(self) -> &'static str {
        match self {
            Month::January => "Januari",
            Month::February => "Februari",
            Month::March => "Maret",
            Month::April => "April",
            Month::May => "Mei",
            Month::June => "Juni",
            Month::July => "Juli",
            Month::August => "Agustus",
            Month::September => "September",
            Month::October => "Oktober",
            Month::November => "November",
            Month::December => "Desember",
        }
    }

    /// Parse a free-text month label, case- and whitespace-insensitive.
    ///
    /// Accepts Indonesian and English full names, common three-letter
    /// abbreviations, and numeric `1`..`12`.
    pub fn parse(raw: &str) -> Option<Month> {
        let needle = raw.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Ok(n) = needle.parse::<u8>() {
            return Month::from_number(n);
        }
        match needle.as_str() {
            "januari" | "january" | "jan" => Some(Month::January),
            "februari" | "february" | "feb" | "peb" => Some(Month::February),
            "maret" | "march" | "mar" => Some(Month::March),
            "april" | "apr" => Some(Month::April),
            "mei" | "may" => Some(Month::May),
            "juni" | "june" | "jun" => Some(Month::June),
            "juli" | "july" | "jul" => Some(Month::July),
            "agustus" | "august" | "aug" | "agu" | "ags" => Some(Month::August),
            "september" | "sep" | "sept" => Some(Month::September),
            "oktober" | "october" | "oct" | "okt" => Some(Month::October),
            "november" | "nov" | "nop" => Some(Month::November),
            "desember" | "december" | "dec" | "des" => Some(Month::December),
            _ => None,
        }
    }
}

/// A record's month axis value: a recognized calendar month, or the raw
/// label when the text matched nothing.
///
/// Unrecognized labels sort after all twelve calendar months and are kept
/// verbatim for display, so odd rows stay visible at the end of a report
/// instead of vanishing. Equality and hashing of unrecognized labels are
/// ASCII-case-insensitive so user-typed filters match stored labels.
#[derive(Debug, Clone)]
pub enum MonthKey {
    Calendar(Month),
    Unrecognized(String),
}

impl MonthKey {
    pub fn from_raw(raw: &str) -> MonthKey {
        match Month::parse(raw) {
            Some(m) => MonthKey::Calendar(m),
            None => MonthKey::Unrecognized(raw.trim().to_string()),
        }
    }

    /// Ordering slot: 1..=12 for calendar months, 13 for everything else.
    pub fn slot(&self) -> u8 {
        match self {
            MonthKey::Calendar(m) => m.number(),
            MonthKey::Unrecognized(_) => 13,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MonthKey::Calendar(m) => m.label(),
            MonthKey::Unrecognized(raw) => raw,
        }
    }
}

impl PartialEq for MonthKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MonthKey::Calendar(a), MonthKey::Calendar(b)) => a == b,
            (MonthKey::Unrecognized(a), MonthKey::Unrecognized(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl Eq for MonthKey {}

impl Hash for MonthKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            MonthKey::Calendar(m) => {
                0u8.hash(state);
                m.number().hash(state);
            }
            MonthKey::Unrecognized(raw) => {
                1u8.hash(state);
                raw.to_ascii_lowercase().hash(state);
            }
        }
    }
}

/// One normalized observation. Missing numerics stay `None`; sums and
/// means decide for themselves how to treat them.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub year: i32,
    pub month: MonthKey,
    pub category: String,
    pub planned: Option<f64>,
    pub actual: Option<f64>,
    pub capture_ratio: Option<f64>,
    pub passengers: Option<f64>,
    pub traffic: Option<f64>,
}

/// Immutable, month-ordered sequence of records from one input file.
///
/// Constructed only by `normalize`; rebuilt from scratch whenever a new
/// file is supplied.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub(crate) fn new(records: Vec<Record>) -> Dataset {
        Dataset { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn observed_years(&self) -> BTreeSet<i32> {
        self.records.iter().map(|r| r.year).collect()
    }

    pub fn observed_categories(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.category.clone()).collect()
    }

    /// Distinct months in slot order (calendar first, unrecognized last).
    pub fn observed_months(&self) -> Vec<MonthKey> {
        let mut months: Vec<MonthKey> = Vec::new();
        for r in &self.records {
            if !months.contains(&r.month) {
                months.push(r.month.clone());
            }
        }
        months.sort_by_key(|m| m.slot());
        months
    }
}

/// Maps logical fields to physical header names, with the optional columns
/// individually activatable. One config object instead of parallel script
/// variants.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub year: String,
    pub month: String,
    pub category: String,
    pub planned: String,
    pub actual: String,
    pub capture_ratio: Option<String>,
    pub passengers: Option<String>,
    pub traffic: Option<String>,
}

impl Default for ColumnMap {
    fn default() -> ColumnMap {
        ColumnMap {
            year: "Tahun".to_string(),
            month: "Bulan".to_string(),
            category: "Kategori".to_string(),
            planned: "RKAP".to_string(),
            actual: "Achievement".to_string(),
            capture_ratio: Some("Capture Ratio".to_string()),
            passengers: Some("PAX".to_string()),
            traffic: Some("Traffic".to_string()),
        }
    }
}

impl ColumnMap {
    /// Every active column name, in export order.
    pub fn active_columns(&self) -> Vec<&str> {
        let mut cols = vec![
            self.year.as_str(),
            self.month.as_str(),
            self.category.as_str(),
            self.planned.as_str(),
            self.actual.as_str(),
        ];
        for opt in [&self.capture_ratio, &self.passengers, &self.traffic] {
            if let Some(name) = opt {
                cols.push(name.as_str());
            }
        }
        cols
    }

    /// Default required-column list: everything active, like the source
    /// exports demanded.
    pub fn required_columns(&self) -> Vec<String> {
        self.active_columns().iter().map(|c| c.to_string()).collect()
    }
}

/// User-selected subsets per dimension. An empty set on any dimension
/// matches nothing; callers wanting "show all" must fill in the observed
/// domain (see `all_of`).
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    pub years: HashSet<i32>,
    pub categories: HashSet<String>,
    pub months: HashSet<MonthKey>,
}

impl FilterSelection {
    /// Selection covering every value observed in the dataset.
    pub fn all_of(dataset: &Dataset) -> FilterSelection {
        FilterSelection {
            years: dataset.observed_years().into_iter().collect(),
            categories: dataset.observed_categories().into_iter().collect(),
            months: dataset.observed_months().into_iter().collect(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.years.contains(&record.year)
            && self.categories.contains(&record.category)
            && self.months.contains(&record.month)
    }
}

/// Aggregates over one filtered row-set. `None` is the sentinel for
/// undefined values (empty set, all-missing ratios, zero planned total);
/// callers must check before display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub row_count: usize,
    pub total_planned: f64,
    pub total_actual: f64,
    pub mean_capture_ratio: Option<f64>,
    pub achievement_vs_plan_percent: Option<f64>,
}

/// Console display row with locale-formatted values; "-" marks missing.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DetailRow {
    #[serde(rename = "Tahun")]
    #[tabled(rename = "Tahun")]
    pub year: i32,
    #[serde(rename = "Bulan")]
    #[tabled(rename = "Bulan")]
    pub month: String,
    #[serde(rename = "Kategori")]
    #[tabled(rename = "Kategori")]
    pub category: String,
    #[serde(rename = "RKAP")]
    #[tabled(rename = "RKAP")]
    pub planned: String,
    #[serde(rename = "Achievement")]
    #[tabled(rename = "Achievement")]
    pub actual: String,
    #[serde(rename = "CaptureRatio")]
    #[tabled(rename = "CaptureRatio")]
    pub capture_ratio: String,
    #[serde(rename = "PAX")]
    #[tabled(rename = "PAX")]
    pub passengers: String,
    #[serde(rename = "Traffic")]
    #[tabled(rename = "Traffic")]
    pub traffic: String,
}

impl DetailRow {
    pub fn from_record(r: &Record) -> DetailRow {
        fn cell(v: Option<f64>, decimals: usize) -> String {
            match v {
                Some(v) => format_number(v, decimals),
                None => "-".to_string(),
            }
        }
        DetailRow {
            year: r.year,
            month: r.month.label().to_string(),
            category: r.category.clone(),
            planned: cell(r.planned, 2),
            actual: cell(r.actual, 2),
            capture_ratio: cell(r.capture_ratio, 1),
            passengers: cell(r.passengers, 0),
            traffic: cell(r.traffic, 0),
        }
    }
}
