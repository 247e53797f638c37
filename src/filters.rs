//! Equality filters over record dimensions, plus the small table helpers the
//! dashboard needs (filter options and metric sorting).

use crate::types::{GeoRecord, MediaRecord};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// A record whose categorical fields can be addressed by name.
pub trait Dimensional {
    type Dimension: Copy + Ord + fmt::Debug;

    fn dimension(&self, dim: Self::Dimension) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeoDimension {
    Date,
    Platform,
    Keyword,
    KeywordType,
    ExposeType,
    Outcome,
}

impl Dimensional for GeoRecord {
    type Dimension = GeoDimension;

    fn dimension(&self, dim: GeoDimension) -> &str {
        match dim {
            GeoDimension::Date => &self.date,
            GeoDimension::Platform => &self.platform,
            GeoDimension::Keyword => &self.keyword,
            GeoDimension::KeywordType => &self.keyword_type,
            GeoDimension::ExposeType => &self.expose_type,
            GeoDimension::Outcome => self.outcome.as_token(),
        }
    }
}

impl FromStr for GeoDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(GeoDimension::Date),
            "platform" => Ok(GeoDimension::Platform),
            "keyword" => Ok(GeoDimension::Keyword),
            "keywordtype" | "keyword_type" => Ok(GeoDimension::KeywordType),
            "exposetype" | "expose_type" => Ok(GeoDimension::ExposeType),
            "outcome" | "win" => Ok(GeoDimension::Outcome),
            other => Err(format!("unknown GEO dimension '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MediaDimension {
    Project,
    Media,
    Platform,
    Account,
    Date,
}

impl Dimensional for MediaRecord {
    type Dimension = MediaDimension;

    fn dimension(&self, dim: MediaDimension) -> &str {
        match dim {
            MediaDimension::Project => &self.project,
            MediaDimension::Media => &self.media,
            MediaDimension::Platform => &self.platform,
            MediaDimension::Account => &self.account,
            MediaDimension::Date => &self.date,
        }
    }
}

impl FromStr for MediaDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(MediaDimension::Project),
            "media" => Ok(MediaDimension::Media),
            "platform" => Ok(MediaDimension::Platform),
            "account" => Ok(MediaDimension::Account),
            "date" => Ok(MediaDimension::Date),
            other => Err(format!("unknown media dimension '{other}'")),
        }
    }
}

/// The user's current selections: one exact-match value per dimension.
///
/// Only non-empty values are stored, so an absent dimension and an empty
/// selection mean the same thing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState<D: Ord> {
    selections: BTreeMap<D, String>,
}

impl<D: Ord> Default for FilterState<D> {
    fn default() -> Self {
        Self {
            selections: BTreeMap::new(),
        }
    }
}

impl<D: Copy + Ord> FilterState<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for `dim`; an empty value clears it.
    pub fn select(&mut self, dim: D, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.selections.remove(&dim);
        } else {
            self.selections.insert(dim, value);
        }
    }

    pub fn clear_all(&mut self) {
        self.selections.clear();
    }

    pub fn get(&self, dim: D) -> Option<&str> {
        self.selections.get(&dim).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = (D, &str)> + '_ {
        self.selections.iter().map(|(d, v)| (*d, v.as_str()))
    }

    /// All active selections hold for `record` (case-sensitive).
    pub fn matches<R>(&self, record: &R) -> bool
    where
        R: Dimensional<Dimension = D>,
    {
        self.active().all(|(dim, value)| record.dimension(dim) == value)
    }
}

/// Keep the records that satisfy every active selection, in input order.
pub fn apply_filters<R>(records: &[R], filters: &FilterState<R::Dimension>) -> Vec<R>
where
    R: Dimensional + Clone,
{
    records
        .iter()
        .filter(|r| filters.matches(*r))
        .cloned()
        .collect()
}

/// Non-empty distinct values of `dim`, in first-seen order. Feeds the filter
/// drop-downs.
pub fn distinct_values<R: Dimensional>(records: &[R], dim: R::Dimension) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for r in records {
        let v = r.dimension(dim);
        if !v.is_empty() && seen.insert(v) {
            out.push(v.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaMetric {
    Reads,
    Interactions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A sorted copy of `records`; equal values keep their input order.
pub fn sort_by_metric(records: &[MediaRecord], metric: MediaMetric, order: SortOrder) -> Vec<MediaRecord> {
    let mut sorted = records.to_vec();
    let key = |r: &MediaRecord| match metric {
        MediaMetric::Reads => r.reads,
        MediaMetric::Interactions => r.interactions,
    };
    match order {
        SortOrder::Ascending => sorted.sort_by_key(|r| key(r)),
        SortOrder::Descending => sorted.sort_by(|a, b| key(b).cmp(&key(a))),
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo(key: usize, platform: &str, keyword_type: &str) -> GeoRecord {
        GeoRecord {
            key,
            platform: platform.to_string(),
            keyword_type: keyword_type.to_string(),
            ..GeoRecord::default()
        }
    }

    fn sample() -> Vec<GeoRecord> {
        vec![
            geo(0, "豆包", "品牌词"),
            geo(1, "DeepSeek", "场景词"),
            geo(2, "豆包", "场景词"),
            geo(3, "deepseek", "场景词"),
        ]
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let records = sample();
        let out = apply_filters(&records, &FilterState::new());
        assert_eq!(out, records);
    }

    #[test]
    fn clearing_all_selections_restores_the_full_set() {
        let records = sample();
        let mut filters = FilterState::new();
        filters.select(GeoDimension::Platform, "豆包");
        filters.select(GeoDimension::KeywordType, "场景词");
        assert_eq!(apply_filters(&records, &filters).len(), 1);

        filters.clear_all();
        assert!(filters.is_empty());
        assert_eq!(filters.get(GeoDimension::Platform), None);
        assert_eq!(apply_filters(&records, &filters), records);
    }

    #[test]
    fn single_filter_is_exact_and_case_sensitive() {
        let records = sample();
        let mut filters = FilterState::new();
        filters.select(GeoDimension::Platform, "DeepSeek");
        let out = apply_filters(&records, &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, 1);
    }

    #[test]
    fn selections_combine_with_and_and_keep_order() {
        let records = sample();
        let mut filters = FilterState::new();
        filters.select(GeoDimension::KeywordType, "场景词");
        let keys: Vec<usize> = apply_filters(&records, &filters).iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![1, 2, 3]);

        filters.select(GeoDimension::Platform, "豆包");
        let keys: Vec<usize> = apply_filters(&records, &filters).iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![2]);
    }

    #[test]
    fn empty_value_clears_a_selection() {
        let mut filters = FilterState::new();
        filters.select(GeoDimension::Platform, "豆包");
        assert_eq!(filters.get(GeoDimension::Platform), Some("豆包"));
        filters.select(GeoDimension::Platform, "");
        assert!(filters.is_empty());
        assert_eq!(apply_filters(&sample(), &filters).len(), 4);
    }

    #[test]
    fn outcome_dimension_filters_on_token() {
        let mut records = sample();
        records[2].outcome = crate::types::WinOutcome::Win;
        let mut filters = FilterState::new();
        filters.select(GeoDimension::Outcome, "是");
        let out = apply_filters(&records, &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, 2);
    }

    #[test]
    fn distinct_values_in_first_seen_order() {
        let mut records = sample();
        records.push(geo(4, "", "痛点词"));
        assert_eq!(
            distinct_values(&records, GeoDimension::Platform),
            vec!["豆包", "DeepSeek", "deepseek"]
        );
    }

    #[test]
    fn parse_dimension_names() {
        assert_eq!("keywordType".parse::<GeoDimension>(), Ok(GeoDimension::KeywordType));
        assert_eq!(" Platform ".parse::<MediaDimension>(), Ok(MediaDimension::Platform));
        assert!("colour".parse::<GeoDimension>().is_err());
    }

    #[test]
    fn sort_by_metric_is_stable() {
        let rec = |id: &str, reads: u64| MediaRecord {
            id: id.to_string(),
            reads,
            ..MediaRecord::default()
        };
        let records = vec![rec("a", 5), rec("b", 9), rec("c", 5), rec("d", 1)];
        let ids = |v: Vec<MediaRecord>| v.into_iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(
            ids(sort_by_metric(&records, MediaMetric::Reads, SortOrder::Descending)),
            vec!["b", "a", "c", "d"]
        );
        assert_eq!(
            ids(sort_by_metric(&records, MediaMetric::Reads, SortOrder::Ascending)),
            vec!["d", "a", "c", "b"]
        );
        assert_eq!(records[0].id, "a");
    }
}
