use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sheet::ScoredRow;

pub const DISTRIBUTION_BUCKETS: [&str; 5] = ["0-20", "20-40", "40-60", "60-80", "80-100"];

/// 已完成文件的分数摘要，随目录条目一起保存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStats {
    pub total_questions: usize,
    pub scored_questions: usize,
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub score_distribution: BTreeMap<String, usize>,
}

/// Summary over rows whose score parses. `None` when the file has no
/// `score` column or no row has a numeric score.
pub fn score_stats(rows: &[ScoredRow]) -> Option<ScoreStats> {
    if !rows.first()?.has_field("score") {
        return None;
    }
    let scores: Vec<f64> = rows.iter().filter_map(ScoredRow::parsed_score).collect();
    if scores.is_empty() {
        return None;
    }

    let sum: f64 = scores.iter().sum();
    let avg = sum / scores.len() as f64;
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut dist: BTreeMap<String, usize> =
        DISTRIBUTION_BUCKETS.iter().map(|b| (b.to_string(), 0)).collect();
    for s in &scores {
        let bucket = match *s {
            s if (0.0..20.0).contains(&s) => Some(DISTRIBUTION_BUCKETS[0]),
            s if (20.0..40.0).contains(&s) => Some(DISTRIBUTION_BUCKETS[1]),
            s if (40.0..60.0).contains(&s) => Some(DISTRIBUTION_BUCKETS[2]),
            s if (60.0..80.0).contains(&s) => Some(DISTRIBUTION_BUCKETS[3]),
            s if (80.0..=100.0).contains(&s) => Some(DISTRIBUTION_BUCKETS[4]),
            _ => None,
        };
        if let Some(b) = bucket {
            *dist.entry(b.to_string()).or_default() += 1;
        }
    }

    Some(ScoreStats {
        total_questions: rows.len(),
        scored_questions: scores.len(),
        average_score: (avg * 100.0).round() / 100.0,
        min_score: min,
        max_score: max,
        score_distribution: dist,
    })
}
