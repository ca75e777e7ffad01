use std::io;

use thiserror::Error;

/// A required column was absent from the input headers.
///
/// Raised before any row processing so the caller gets one diagnostic
/// naming every missing column instead of a downstream type error. Fatal
/// for the current file: no partial dataset is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required columns: {}", .missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}

/// Error type for the loader and output layers.
///
/// Cell-level parse problems are deliberately NOT represented here: they
/// are absorbed during normalization as missing values.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
