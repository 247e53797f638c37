use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tabled::Tabled;

/// Cell text meaning "yes" in exposure and win columns.
pub const YES_TOKEN: &str = "是";
/// Cell text meaning "no".
pub const NO_TOKEN: &str = "否";
/// Win column text for "no comparable competitor in the answer".
pub const NO_COMPETITOR_TOKEN: &str = "无竞品";

/// Head-to-head outcome against a competitor for one GEO detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WinOutcome {
    #[default]
    Unspecified,
    Win,
    Loss,
    NoCompetitor,
}

impl WinOutcome {
    /// Empty text is unspecified; any token other than yes / no-competitor
    /// counts as a loss.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "" => WinOutcome::Unspecified,
            YES_TOKEN => WinOutcome::Win,
            NO_COMPETITOR_TOKEN => WinOutcome::NoCompetitor,
            _ => WinOutcome::Loss,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            WinOutcome::Unspecified => "",
            WinOutcome::Win => YES_TOKEN,
            WinOutcome::Loss => NO_TOKEN,
            WinOutcome::NoCompetitor => NO_COMPETITOR_TOKEN,
        }
    }

    /// Part of the competitive subset used by the win rate.
    pub fn is_competitive(self) -> bool {
        matches!(self, WinOutcome::Win | WinOutcome::Loss)
    }
}

impl From<String> for WinOutcome {
    fn from(s: String) -> Self {
        WinOutcome::from_token(&s)
    }
}

impl From<WinOutcome> for String {
    fn from(o: WinOutcome) -> Self {
        o.as_token().to_string()
    }
}

impl fmt::Display for WinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// One GEO detection: a query run against an AI assistant and whether the
/// brand showed up in the answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase", default)]
pub struct GeoRecord {
    #[tabled(rename = "#")]
    #[serde(deserialize_with = "null_as_default")]
    pub key: usize,
    #[tabled(rename = "Date")]
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[tabled(rename = "Platform")]
    #[serde(deserialize_with = "null_as_default")]
    pub platform: String,
    #[tabled(rename = "Keyword")]
    #[serde(deserialize_with = "null_as_default")]
    pub keyword: String,
    #[tabled(rename = "KeywordType")]
    #[serde(deserialize_with = "null_as_default")]
    pub keyword_type: String,
    #[tabled(rename = "Exposed")]
    #[serde(deserialize_with = "null_as_default")]
    pub is_exposed: bool,
    /// Rank in the answer; 0 means not ranked.
    #[tabled(rename = "Position")]
    #[serde(deserialize_with = "null_as_default")]
    pub position: u32,
    #[tabled(rename = "ExposeType")]
    #[serde(deserialize_with = "null_as_default")]
    pub expose_type: String,
    #[serde(rename = "isWin", deserialize_with = "null_as_default")]
    #[tabled(rename = "Win")]
    pub outcome: WinOutcome,
    #[tabled(skip)]
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[tabled(skip)]
    #[serde(deserialize_with = "null_as_default")]
    pub screenshot: String,
}

impl GeoRecord {
    pub fn rank(&self) -> Option<u32> {
        (self.position > 0).then_some(self.position)
    }
}

/// One published media placement and its performance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Tabled)]
#[serde(default)]
pub struct MediaRecord {
    #[tabled(rename = "#")]
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[tabled(skip)]
    #[serde(deserialize_with = "null_as_default")]
    pub project: String,
    #[tabled(rename = "Media")]
    #[serde(deserialize_with = "null_as_default")]
    pub media: String,
    #[tabled(rename = "Platform")]
    #[serde(deserialize_with = "null_as_default")]
    pub platform: String,
    #[tabled(rename = "Account")]
    #[serde(deserialize_with = "null_as_default")]
    pub account: String,
    /// Placement slot on the outlet, free text.
    #[tabled(rename = "Placement")]
    #[serde(deserialize_with = "null_as_default")]
    pub position: String,
    #[tabled(rename = "Title")]
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[tabled(skip)]
    #[serde(deserialize_with = "null_as_default")]
    pub link: String,
    #[tabled(rename = "Reads", display_with = "display_reads")]
    #[serde(deserialize_with = "null_as_default")]
    pub reads: u64,
    #[tabled(rename = "Interactions")]
    #[serde(deserialize_with = "null_as_default")]
    pub interactions: u64,
    #[tabled(skip)]
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn display_reads(reads: &u64) -> String {
    crate::util::format_reads(*reads)
}

fn one_decimal(v: &f64) -> String {
    format!("{v:.1}")
}

/// Headline numbers for the KPI cards. Rates are percentages rounded to one
/// decimal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    #[tabled(rename = "Total")]
    pub total_count: usize,
    #[tabled(rename = "Exposed")]
    pub exposed_count: usize,
    #[tabled(rename = "ExposureRate%", display_with = "one_decimal")]
    pub exposure_rate: f64,
    #[tabled(rename = "AvgPosition", display_with = "one_decimal")]
    pub avg_position: f64,
    #[tabled(rename = "Top3Rate%", display_with = "one_decimal")]
    pub top_three_rate: f64,
    #[tabled(rename = "WinRate%", display_with = "one_decimal")]
    pub win_rate: f64,
    #[tabled(rename = "FirstChoiceRate%", display_with = "one_decimal")]
    pub first_choice_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CategoryRate {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Total")]
    pub total: usize,
    #[tabled(rename = "Exposed")]
    pub exposed: usize,
    #[tabled(rename = "Rate%", display_with = "one_decimal")]
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct TrendPoint {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Total")]
    pub total: usize,
    #[tabled(rename = "Exposed")]
    pub exposed: usize,
    #[tabled(rename = "Rate%", display_with = "one_decimal")]
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct DistributionEntry {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Count")]
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct BucketEntry {
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct MediaTotals {
    #[tabled(rename = "Records")]
    pub records: usize,
    #[tabled(rename = "Reads")]
    pub total_reads: u64,
    #[tabled(rename = "Interactions")]
    pub total_interactions: u64,
}

/// Everything the GEO dashboard renders for one filtered snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoSummary {
    pub kpis: KpiSummary,
    pub platform_rates: Vec<CategoryRate>,
    pub keyword_type_rates: Vec<CategoryRate>,
    pub trend: Vec<TrendPoint>,
    pub expose_types: Vec<DistributionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSummary {
    pub totals: MediaTotals,
    pub platform_share: Vec<BucketEntry>,
}
