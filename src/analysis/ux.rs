//! Weighted user-experience score from the most recent samples

use serde::{Deserialize, Serialize};

use crate::metrics::{average, names, Metric};

use super::scoring::{clamp_score, memory_score, network_score, rendering_score, HEALTHY_SCORE};

/// Interaction latency that maps to a zero sub-score (ms)
pub const INTERACTION_BUDGET_MS: f64 = 200.0;

/// Sub-score weights
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UxWeights {
    pub fps: f64,
    pub memory: f64,
    pub network: f64,
    pub interaction: f64,
}

impl Default for UxWeights {
    fn default() -> Self {
        Self {
            fps: 0.30,
            memory: 0.20,
            network: 0.25,
            interaction: 0.25,
        }
    }
}

/// Sub-scores behind a UX score; `None` where the window had no samples
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UxBreakdown {
    pub fps: Option<f64>,
    pub memory: Option<f64>,
    pub network: Option<f64>,
    pub interaction: Option<f64>,
    /// Weighted composite (0-100)
    pub score: f64,
}

/// `100 - avg / 200 * 100`, clamped to 0-100
pub fn interaction_score(avg_latency_ms: f64) -> f64 {
    clamp_score(100.0 - avg_latency_ms / INTERACTION_BUDGET_MS * 100.0)
}

/// Computes the composite over samples already restricted to the UX window.
///
/// Sub-scores without data are left out of both the weighted sum and the
/// weight total; no data at all scores 100.
pub fn ux_breakdown(samples: &[Metric], weights: &UxWeights) -> UxBreakdown {
    let fps = average(samples, names::FPS).map(rendering_score);
    let memory = average(samples, names::MEMORY_USAGE).map(memory_score);
    let network = average(samples, names::LATENCY).map(network_score);
    let interaction = average(samples, names::INTERACTION_LATENCY).map(interaction_score);

    let parts = [
        (fps, weights.fps),
        (memory, weights.memory),
        (network, weights.network),
        (interaction, weights.interaction),
    ];

    let (weighted, total_weight) = parts
        .iter()
        .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
        .fold((0.0, 0.0), |(sum, total), (s, w)| (sum + s, total + w));

    let score = if total_weight > 0.0 {
        weighted / total_weight
    } else {
        HEALTHY_SCORE
    };

    UxBreakdown {
        fps,
        memory,
        network,
        interaction,
        score,
    }
}

/// Composite UX score with the default weights
pub fn ux_score(samples: &[Metric]) -> f64 {
    ux_breakdown(samples, &UxWeights::default()).score
}
