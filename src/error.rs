//! Dashboard error types.

use thiserror::Error;

/// Errors raised while loading data or configuration.
///
/// Aggregation and filtering never fail; only the edges of the crate do.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The uploaded payload could not be decoded as a spreadsheet.
    #[error("Spreadsheet parse error: {0}")]
    Parse(String),

    /// JSON source or config file error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<calamine::Error> for DashboardError {
    fn from(err: calamine::Error) -> Self {
        DashboardError::Parse(err.to_string())
    }
}

/// Result type for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;
