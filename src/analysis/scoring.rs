//! Category health scoring (0-100)

use std::collections::BTreeMap;

use crate::metrics::{average, names, Category, Metric};

/// Score of a category with no evidence of trouble
pub const HEALTHY_SCORE: f64 = 100.0;

/// Flat score for categories without a dedicated formula
pub const NEUTRAL_SCORE: f64 = 75.0;

/// Frame rate treated as perfect rendering
pub const TARGET_FPS: f64 = 60.0;

/// Scores one category from its samples.
///
/// Only samples of `category` are considered. An empty category, or one
/// without the metric its formula reads, scores [`HEALTHY_SCORE`].
pub fn score_category(category: Category, samples: &[Metric]) -> f64 {
    let own: Vec<Metric> = samples
        .iter()
        .filter(|m| m.category == category)
        .cloned()
        .collect();
    if own.is_empty() {
        return HEALTHY_SCORE;
    }

    let score = match category {
        Category::Rendering => average(&own, names::FPS).map(rendering_score),
        Category::Memory => average(&own, names::MEMORY_USAGE).map(memory_score),
        Category::Network => average(&own, names::LATENCY).map(network_score),
        Category::UserInteraction | Category::Bundle | Category::Custom => Some(NEUTRAL_SCORE),
    };

    score.unwrap_or(HEALTHY_SCORE)
}

/// `min(100, avg_fps / 60 * 100)`
pub fn rendering_score(avg_fps: f64) -> f64 {
    clamp_score(avg_fps / TARGET_FPS * 100.0)
}

/// `max(0, 100 - avg_usage)`
pub fn memory_score(avg_usage: f64) -> f64 {
    clamp_score(100.0 - avg_usage)
}

/// `max(0, 100 - avg_latency / 1000 * 20)`
pub fn network_score(avg_latency_ms: f64) -> f64 {
    clamp_score(100.0 - avg_latency_ms / 1000.0 * 20.0)
}

pub(crate) fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Scores every category that has at least one sample in `samples`
pub fn category_scores(samples: &[Metric]) -> BTreeMap<Category, f64> {
    Category::ALL
        .iter()
        .filter(|c| samples.iter().any(|m| m.category == **c))
        .map(|c| (*c, score_category(*c, samples)))
        .collect()
}

/// Unweighted mean of the category scores, [`HEALTHY_SCORE`] when empty
pub fn overall_score(scores: &BTreeMap<Category, f64>) -> f64 {
    if scores.is_empty() {
        return HEALTHY_SCORE;
    }
    scores.values().sum::<f64>() / scores.len() as f64
}
