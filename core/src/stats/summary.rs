use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sheet::ScoredRow;

/// Bucket for rows without a parent_class / subclass.
pub const DEFAULT_CATEGORY: &str = "其他";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    #[serde(default)]
    pub average_score: f64,
    #[serde(default)]
    pub max_score: f64,
    #[serde(default)]
    pub min_score: f64,
    #[serde(default)]
    pub total_questions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    #[serde(default)]
    pub total_score: f64,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub average_score: f64,
}

/// 一组行的统计结果。也用于承接评分进程上报的统计，因此所有字段都有默认值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    #[serde(default)]
    pub overall: OverallStats,
    #[serde(default)]
    pub by_parent_class: BTreeMap<String, CategoryStats>,
    #[serde(default)]
    pub by_sub_class: BTreeMap<String, CategoryStats>,
    /// `Some(false)` marks a placeholder for a file without scores.
    #[serde(
        default,
        rename = "hasScoreData",
        skip_serializing_if = "Option::is_none"
    )]
    pub has_score_data: Option<bool>,
}

/// Aggregate and per-category statistics.
///
/// Unparsable or missing scores count as 0. `max_score` and `min_score` are
/// seeded with 0 and 1, so an empty input reports `min_score == 1` and a set
/// whose scores all exceed 1 still reports a minimum of 1.
pub fn compute_statistics(rows: &[ScoredRow]) -> StatisticsSummary {
    let mut overall = OverallStats {
        average_score: 0.0,
        max_score: 0.0,
        min_score: 1.0,
        total_questions: rows.len(),
    };
    let mut by_parent_class: BTreeMap<String, CategoryStats> = BTreeMap::new();
    let mut by_sub_class: BTreeMap<String, CategoryStats> = BTreeMap::new();

    if rows.is_empty() {
        return StatisticsSummary {
            overall,
            by_parent_class,
            by_sub_class,
            has_score_data: None,
        };
    }

    let mut total = 0.0;
    for row in rows {
        let score = row.score();
        total += score;
        if score > overall.max_score {
            overall.max_score = score;
        }
        if score < overall.min_score {
            overall.min_score = score;
        }
        add_to_bucket(&mut by_parent_class, category(row, "parent_class"), score);
        add_to_bucket(&mut by_sub_class, category(row, "subclass"), score);
    }
    overall.average_score = total / rows.len() as f64;

    for bucket in by_parent_class.values_mut().chain(by_sub_class.values_mut()) {
        bucket.average_score = bucket.total_score / bucket.count as f64;
    }

    StatisticsSummary {
        overall,
        by_parent_class,
        by_sub_class,
        has_score_data: None,
    }
}

/// Zero-valued summary for a side whose file carries no `score` column.
pub fn placeholder_summary(total_questions: usize) -> StatisticsSummary {
    StatisticsSummary {
        overall: OverallStats {
            total_questions,
            ..OverallStats::default()
        },
        has_score_data: Some(false),
        ..StatisticsSummary::default()
    }
}

/// Signed difference, compare minus base.
pub fn score_delta(base: f64, compare: f64) -> f64 {
    compare - base
}

/// Three decimals, never "-0.000".
pub fn format_score(v: f64) -> String {
    let v = if v == 0.0 { 0.0 } else { v };
    let s = format!("{v:.3}");
    if s == "-0.000" {
        "0.000".to_string()
    } else {
        s
    }
}

/// Like [`format_score`] but with an explicit `+` on gains, e.g. "+0.200".
pub fn format_delta(delta: f64) -> String {
    let s = format_score(delta);
    if delta > 0.0 && !s.starts_with('-') && s != "0.000" {
        format!("+{s}")
    } else {
        s
    }
}

fn category(row: &ScoredRow, field: &str) -> String {
    let name = row.text(field);
    if name.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        name
    }
}

fn add_to_bucket(map: &mut BTreeMap<String, CategoryStats>, key: String, score: f64) {
    let bucket = map.entry(key).or_default();
    bucket.total_score += score;
    bucket.count += 1;
}
