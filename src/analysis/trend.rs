//! Per-metric trend classification
//!
//! A series is split into an earlier half (`floor(n/2)` points) and a later
//! half; the relative change between the two means decides the direction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::TrendPolarity;
use crate::metrics::{names, Metric};

/// Changes smaller than this (in percent) are stable
pub const STABILITY_THRESHOLD_PERCENT: f64 = 5.0;

/// Change magnitude (in percent) that maps to full confidence
pub const CONFIDENCE_REFERENCE_PERCENT: f64 = 50.0;

/// Trend direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Stable,
    Improving,
    Degrading,
}

/// Trend of one named metric
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trend {
    /// Metric name
    pub metric: String,
    pub direction: TrendDirection,
    /// Relative change between the two half-means, in percent
    pub change_percent: f64,
    /// 0-100
    pub confidence: f64,
    /// Number of points the trend was computed from
    pub sample_count: usize,
}

/// Whether smaller values of `name` are better (latencies, usage, load times)
pub fn is_lower_better(name: &str) -> bool {
    matches!(
        name,
        names::LATENCY | names::MEMORY_USAGE | names::INTERACTION_LATENCY | names::LOAD_TIME
    ) || name.ends_with("_time")
        || name.ends_with("_latency")
}

/// Trend analyzer
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendAnalyzer {
    polarity: TrendPolarity,
}

impl TrendAnalyzer {
    pub fn new(polarity: TrendPolarity) -> Self {
        Self { polarity }
    }

    pub fn polarity(&self) -> TrendPolarity {
        self.polarity
    }

    /// Trend of the samples named `name`, taken in timestamp order
    pub fn analyze(&self, name: &str, samples: &[Metric]) -> Trend {
        let mut series: Vec<&Metric> = samples.iter().filter(|m| m.name == name).collect();
        series.sort_by_key(|m| m.timestamp);
        let values: Vec<f64> = series.iter().map(|m| m.value).collect();
        self.analyze_values(name, &values)
    }

    /// Trend of every distinct metric name in `samples`, ordered by name
    pub fn analyze_all(&self, samples: &[Metric]) -> Vec<Trend> {
        let metric_names: BTreeSet<&str> = samples.iter().map(|m| m.name.as_str()).collect();
        metric_names
            .into_iter()
            .map(|name| self.analyze(name, samples))
            .collect()
    }

    /// Trend of an already ordered series
    pub fn analyze_values(&self, name: &str, values: &[f64]) -> Trend {
        let sample_count = values.len();
        if sample_count < 2 {
            return Trend {
                metric: name.to_string(),
                direction: TrendDirection::Stable,
                change_percent: 0.0,
                confidence: 0.0,
                sample_count,
            };
        }

        let mid = sample_count / 2;
        let first_avg = mean(&values[..mid]);
        let second_avg = mean(&values[mid..]);
        let change_percent = relative_change(first_avg, second_avg);

        let mut direction = if change_percent.abs() < STABILITY_THRESHOLD_PERCENT {
            TrendDirection::Stable
        } else if change_percent > 0.0 {
            TrendDirection::Improving
        } else {
            TrendDirection::Degrading
        };

        if self.polarity == TrendPolarity::MetricAware && is_lower_better(name) {
            direction = match direction {
                TrendDirection::Improving => TrendDirection::Degrading,
                TrendDirection::Degrading => TrendDirection::Improving,
                TrendDirection::Stable => TrendDirection::Stable,
            };
        }

        Trend {
            metric: name.to_string(),
            direction,
            change_percent,
            confidence: (change_percent.abs() / CONFIDENCE_REFERENCE_PERCENT * 100.0).clamp(0.0, 100.0),
            sample_count,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percent change from `from` to `to`. A zero baseline has no relative
/// scale, so any move away from it counts as a full 100% step.
fn relative_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        if to == 0.0 {
            0.0
        } else {
            100.0 * to.signum()
        }
    } else {
        (to - from) / from.abs() * 100.0
    }
}
