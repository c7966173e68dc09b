//! 评分统计：整体与按类别汇总

mod score_stats;
mod summary;

pub use score_stats::{score_stats, ScoreStats, DISTRIBUTION_BUCKETS};
pub use summary::{
    compute_statistics, format_delta, format_score, placeholder_summary, score_delta,
    CategoryStats, OverallStats, StatisticsSummary, DEFAULT_CATEGORY,
};
