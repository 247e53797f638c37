// Aggregations behind the dashboard cards and charts.
//
// Every function here takes the already-filtered records as its only data
// input and returns freshly built rows. Nothing is cached between calls.
use crate::config::DashboardConfig;
use crate::filters::{Dimensional, GeoDimension, MediaDimension};
use crate::types::{
    BucketEntry, CategoryRate, DistributionEntry, GeoRecord, GeoSummary, KpiSummary, MediaRecord,
    MediaSummary, MediaTotals, TrendPoint, WinOutcome,
};
use crate::util::{percent, round1};
use std::collections::{BTreeMap, HashMap};

pub fn kpi_summary(data: &[GeoRecord], first_choice_label: &str) -> KpiSummary {
    let total_count = data.len();
    let exposed: Vec<&GeoRecord> = data.iter().filter(|r| r.is_exposed).collect();
    let exposed_count = exposed.len();

    let ranks: Vec<u32> = exposed.iter().filter_map(|r| r.rank()).collect();
    let avg_position = if ranks.is_empty() {
        0.0
    } else {
        let sum: u64 = ranks.iter().map(|p| u64::from(*p)).sum();
        round1(sum as f64 / ranks.len() as f64)
    };

    let top_three = ranks.iter().filter(|p| **p <= 3).count();

    let competitive: Vec<&GeoRecord> = data.iter().filter(|r| r.outcome.is_competitive()).collect();
    let wins = competitive
        .iter()
        .filter(|r| r.outcome == WinOutcome::Win)
        .count();

    let first_choice = exposed
        .iter()
        .filter(|r| r.expose_type == first_choice_label)
        .count();

    KpiSummary {
        total_count,
        exposed_count,
        exposure_rate: percent(exposed_count, total_count),
        avg_position,
        top_three_rate: percent(top_three, exposed_count),
        win_rate: percent(wins, competitive.len()),
        first_choice_rate: percent(first_choice, total_count),
    }
}

/// Exposure rate per category, in the order of `categories`. Categories with
/// no records are left out.
pub fn category_rates(data: &[GeoRecord], dim: GeoDimension, categories: &[String]) -> Vec<CategoryRate> {
    categories
        .iter()
        .filter_map(|category| {
            let (total, exposed) = data
                .iter()
                .filter(|r| r.dimension(dim) == category.as_str())
                .fold((0usize, 0usize), |(t, e), r| (t + 1, e + usize::from(r.is_exposed)));
            (total > 0).then(|| CategoryRate {
                category: category.clone(),
                total,
                exposed,
                rate: percent(exposed, total),
            })
        })
        .collect()
}

/// Per-date exposure, ascending by date. Records without a date are skipped.
pub fn exposure_trend(data: &[GeoRecord]) -> Vec<TrendPoint> {
    // Dates are canonical YYYY-MM-DD, so key order is chronological order.
    let mut by_date: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for r in data.iter().filter(|r| !r.date.is_empty()) {
        let e = by_date.entry(r.date.as_str()).or_insert((0, 0));
        e.0 += 1;
        if r.is_exposed {
            e.1 += 1;
        }
    }
    by_date
        .into_iter()
        .map(|(date, (total, exposed))| TrendPoint {
            date: date.to_string(),
            total,
            exposed,
            rate: percent(exposed, total),
        })
        .collect()
}

/// Counts of each value of `dim` among exposed records that have one, in
/// first-seen order.
pub fn exposed_distribution(data: &[GeoRecord], dim: GeoDimension) -> Vec<DistributionEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<DistributionEntry> = Vec::new();
    for r in data.iter().filter(|r| r.is_exposed) {
        let v = r.dimension(dim);
        if v.is_empty() {
            continue;
        }
        match index.get(v) {
            Some(&i) => out[i].value += 1,
            None => {
                index.insert(v, out.len());
                out.push(DistributionEntry {
                    name: v.to_string(),
                    value: 1,
                });
            }
        }
    }
    out
}

/// Occurrence counts of `dim` across all records, largest first, capped at
/// `limit` entries. Anything past the cap is summed into one trailing
/// `overflow_label` bucket. Equal counts keep first-seen order.
pub fn top_n_with_overflow<R: Dimensional>(
    data: &[R],
    dim: R::Dimension,
    limit: usize,
    overflow_label: &str,
) -> Vec<BucketEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<BucketEntry> = Vec::new();
    for r in data {
        let v = r.dimension(dim);
        match index.get(v) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(v, counts.len());
                counts.push(BucketEntry {
                    label: v.to_string(),
                    count: 1,
                });
            }
        }
    }
    // sort_by is stable, which is what gives the first-seen tie-break
    counts.sort_by(|a, b| b.count.cmp(&a.count));

    if counts.len() > limit {
        let rest: usize = counts[limit..].iter().map(|b| b.count).sum();
        counts.truncate(limit);
        counts.push(BucketEntry {
            label: overflow_label.to_string(),
            count: rest,
        });
    }
    counts
}

pub fn media_totals(data: &[MediaRecord]) -> MediaTotals {
    MediaTotals {
        records: data.len(),
        total_reads: data.iter().map(|r| r.reads).sum(),
        total_interactions: data.iter().map(|r| r.interactions).sum(),
    }
}

pub fn geo_summary(data: &[GeoRecord], config: &DashboardConfig) -> GeoSummary {
    GeoSummary {
        kpis: kpi_summary(data, &config.first_choice_label),
        platform_rates: category_rates(data, GeoDimension::Platform, &config.platforms),
        keyword_type_rates: category_rates(data, GeoDimension::KeywordType, &config.keyword_types),
        trend: exposure_trend(data),
        expose_types: exposed_distribution(data, GeoDimension::ExposeType),
    }
}

pub fn media_summary(data: &[MediaRecord], config: &DashboardConfig) -> MediaSummary {
    MediaSummary {
        totals: media_totals(data),
        platform_share: top_n_with_overflow(
            data,
            MediaDimension::Platform,
            config.top_n,
            &config.overflow_label,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exposed(position: u32) -> GeoRecord {
        GeoRecord {
            is_exposed: true,
            position,
            ..GeoRecord::default()
        }
    }

    fn on(date: &str, platform: &str, is_exposed: bool) -> GeoRecord {
        GeoRecord {
            date: date.to_string(),
            platform: platform.to_string(),
            is_exposed,
            ..GeoRecord::default()
        }
    }

    fn labels(v: &[BucketEntry]) -> Vec<&str> {
        v.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn kpis_for_three_record_scenario() {
        let data = vec![exposed(2), exposed(0), GeoRecord::default()];
        let k = kpi_summary(&data, "首选推荐");
        assert_eq!(k.total_count, 3);
        assert_eq!(k.exposed_count, 2);
        assert_eq!(k.exposure_rate, 66.7);
        assert_eq!(k.avg_position, 2.0);
        assert_eq!(k.top_three_rate, 50.0);
        assert_eq!(format!("{:.1}", k.avg_position), "2.0");
    }

    #[test]
    fn empty_input_gives_zero_kpis() {
        assert_eq!(kpi_summary(&[], "首选推荐"), KpiSummary::default());
        assert!(exposure_trend(&[]).is_empty());
        assert!(top_n_with_overflow::<GeoRecord>(&[], GeoDimension::Platform, 10, "Other").is_empty());
    }

    #[test]
    fn nothing_exposed_means_zero_exposure_rate() {
        let data = vec![GeoRecord::default(), GeoRecord::default()];
        let k = kpi_summary(&data, "首选推荐");
        assert_eq!(k.exposure_rate, 0.0);
        assert_eq!(k.avg_position, 0.0);
        assert_eq!(k.top_three_rate, 0.0);
    }

    #[test]
    fn rate_denominators_are_exposed_and_competitive_subsets() {
        // 6 records: 4 exposed, 2 of those in the top three; 2 competitive, 1 win
        let mut data = vec![exposed(1), exposed(3), exposed(5), exposed(0)];
        data.push(GeoRecord::default());
        data.push(GeoRecord::default());
        data[0].outcome = WinOutcome::Win;
        data[1].outcome = WinOutcome::Loss;
        data[2].outcome = WinOutcome::NoCompetitor;

        let k = kpi_summary(&data, "首选推荐");
        assert_eq!(k.top_three_rate, 50.0); // 2 / 4, not 2 / 6
        assert_eq!(k.win_rate, 50.0); // 1 / 2, not 1 / 6, and no-competitor is left out
        assert_eq!(k.avg_position, 3.0);
    }

    #[test]
    fn first_choice_rate_is_over_total() {
        let mut data = vec![exposed(1), exposed(2), GeoRecord::default(), GeoRecord::default()];
        data[0].expose_type = "首选推荐".into();
        let k = kpi_summary(&data, "首选推荐");
        assert_eq!(k.first_choice_rate, 25.0);
    }

    #[test]
    fn category_rates_follow_configured_order_and_drop_empty() {
        let data = vec![
            on("", "DeepSeek", true),
            on("", "豆包", false),
            on("", "豆包", true),
            on("", "豆包", true),
            on("", "Kimi", true),
        ];
        let cats: Vec<String> = ["豆包", "文心一言", "DeepSeek"].iter().map(|s| s.to_string()).collect();
        let rates = category_rates(&data, GeoDimension::Platform, &cats);
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].category, "豆包");
        assert_eq!((rates[0].total, rates[0].exposed, rates[0].rate), (3, 2, 66.7));
        assert_eq!(rates[1].category, "DeepSeek");
        assert_eq!(rates[1].rate, 100.0);
    }

    #[test]
    fn trend_is_sorted_and_skips_undated() {
        let data = vec![
            on("2026-01-27", "", true),
            on("2026-01-25", "", false),
            on("", "", true),
            on("2026-01-25", "", true),
        ];
        let trend = exposure_trend(&data);
        let dates: Vec<&str> = trend.iter().map(|t| t.date.as_str()).collect();
        assert_eq!(dates, vec!["2026-01-25", "2026-01-27"]);
        assert_eq!((trend[0].total, trend[0].exposed, trend[0].rate), (2, 1, 50.0));
    }

    #[test]
    fn distribution_counts_exposed_with_value_only() {
        let mut data = vec![exposed(1), exposed(2), exposed(3), GeoRecord::default(), exposed(4)];
        data[0].expose_type = "推荐型".into();
        data[1].expose_type = "首选推荐".into();
        data[2].expose_type = "推荐型".into();
        data[3].expose_type = "推荐型".into(); // not exposed
        let dist = exposed_distribution(&data, GeoDimension::ExposeType);
        assert_eq!(
            dist,
            vec![
                DistributionEntry { name: "推荐型".into(), value: 2 },
                DistributionEntry { name: "首选推荐".into(), value: 1 },
            ]
        );
    }

    #[test]
    fn twelve_singletons_overflow_into_other() {
        let data: Vec<GeoRecord> = (0..12).map(|i| on("", &format!("p{i}"), false)).collect();
        let buckets = top_n_with_overflow(&data, GeoDimension::Platform, 10, "Other");
        assert_eq!(buckets.len(), 11);
        assert_eq!(buckets[..10].iter().map(|b| b.label.clone()).collect::<Vec<_>>(),
            (0..10).map(|i| format!("p{i}")).collect::<Vec<_>>());
        assert_eq!(buckets[10], BucketEntry { label: "Other".into(), count: 2 });
    }

    #[test]
    fn ten_or_fewer_categories_have_no_overflow() {
        let data: Vec<GeoRecord> = (0..10).map(|i| on("", &format!("p{i}"), false)).collect();
        let buckets = top_n_with_overflow(&data, GeoDimension::Platform, 10, "Other");
        assert_eq!(buckets.len(), 10);
        assert!(buckets.iter().all(|b| b.label != "Other"));
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let data = vec![
            on("", "b", false),
            on("", "a", false),
            on("", "c", false),
            on("", "a", false),
            on("", "c", false),
        ];
        let buckets = top_n_with_overflow(&data, GeoDimension::Platform, 10, "Other");
        assert_eq!(labels(&buckets), vec!["a", "c", "b"]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let data = vec![
            on("2026-01-25", "豆包", true),
            on("2026-01-26", "DeepSeek", false),
        ];
        let config = DashboardConfig::default();
        assert_eq!(geo_summary(&data, &config), geo_summary(&data, &config));
    }

    #[test]
    fn media_totals_sum_metrics() {
        let rec = |platform: &str, reads: u64, interactions: u64| MediaRecord {
            platform: platform.into(),
            reads,
            interactions,
            ..MediaRecord::default()
        };
        let data = vec![rec("微博", 100, 3), rec("小红书", 2_500, 40), rec("微博", 0, 0)];
        let summary = media_summary(&data, &DashboardConfig::default());
        assert_eq!(
            summary.totals,
            MediaTotals { records: 3, total_reads: 2_600, total_interactions: 43 }
        );
        assert_eq!(labels(&summary.platform_share), vec!["微博", "小红书"]);
    }
}
