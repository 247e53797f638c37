//! # GEO Dashboard
//!
//! Data side of the GEO / media monitoring dashboards: spreadsheet and JSON
//! ingestion, equality filters, and the aggregations behind the KPI cards,
//! charts and tables. Rendering is left to the caller.

pub mod config;
pub mod error;
pub mod filters;
pub mod loader;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use filters::{apply_filters, FilterState, GeoDimension, MediaDimension};
pub use types::{GeoRecord, MediaRecord, WinOutcome};
