//! Dashboard configuration.
//!
//! Holds the closed category lists that fix chart axis order, plus the
//! labels and limits the aggregations need. Every field has a default, so a
//! config file only has to name what it changes.

use crate::error::{DashboardError, Result};
use crate::util::DateEpoch;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Static GEO source loaded at start-up.
    pub geo_data_path: String,
    /// Static media-performance source loaded at start-up.
    pub media_data_path: String,
    /// Platform axis of the per-platform exposure chart.
    pub platforms: Vec<String>,
    /// Axis of the per-keyword-type exposure chart.
    pub keyword_types: Vec<String>,
    /// Exposure type counted by the first-choice rate.
    pub first_choice_label: String,
    /// Number of named buckets before the overflow bucket.
    pub top_n: usize,
    pub overflow_label: String,
    /// Epoch for serial dates in uploaded sheets.
    pub date_epoch: DateEpoch,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            geo_data_path: "data/geo_demo.json".to_string(),
            media_data_path: "data/media_demo.json".to_string(),
            platforms: owned(&["豆包", "文心一言", "DeepSeek", "通义千问"]),
            keyword_types: owned(&["品牌词", "场景词", "对比词", "痛点词"]),
            first_choice_label: "首选推荐".to_string(),
            top_n: 10,
            overflow_label: "Other".to_string(),
            date_epoch: DateEpoch::Excel1900,
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!(path = %path.display(), "loaded dashboard config");
        Ok(config)
    }

    /// Like [`DashboardConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(DashboardError::Config("top_n must be at least 1".into()));
        }
        if self.overflow_label.is_empty() {
            return Err(DashboardError::Config("overflow_label must not be empty".into()));
        }
        Ok(())
    }
}
