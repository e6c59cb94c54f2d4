//! Bottleneck detection and analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::config::ThresholdTable;
use crate::metrics::{average, names, Category, Metric};

use super::scoring::TARGET_FPS;

/// Kind of component a bottleneck lives in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckType {
    /// UI component rendering
    Component,
    /// Network I/O
    Network,
    /// Memory pressure
    Memory,
    /// Main-thread computation
    Computation,
    /// Loading and disk I/O
    Io,
}

impl BottleneckType {
    /// Returns a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            BottleneckType::Component => "Component Rendering",
            BottleneckType::Network => "Network I/O",
            BottleneckType::Memory => "Memory Usage",
            BottleneckType::Computation => "Computation",
            BottleneckType::Io => "Loading I/O",
        }
    }
}

/// Severity levels for bottlenecks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Low severity
    Low,
    /// Medium severity
    Medium,
    /// High severity
    High,
    /// Critical severity
    Critical,
}

/// Detected performance bottleneck
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bottleneck {
    /// Scan-scoped identifier, `<category>-<metric>-<detected_at millis>`
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BottleneckType,
    pub severity: Severity,
    pub description: String,
    /// 0-100
    pub impact: f64,
    pub affected_metrics: Vec<String>,
    pub detected_at: DateTime<Utc>,
    pub suggested_fix: String,
    /// 0-100
    pub estimated_improvement: f64,
}

impl Bottleneck {
    fn new(
        category: Category,
        metric: &str,
        kind: BottleneckType,
        severity: Severity,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("{}-{}-{}", category, metric, detected_at.timestamp_millis()),
            kind,
            severity,
            description: String::new(),
            impact: 0.0,
            affected_metrics: vec![metric.to_string()],
            detected_at,
            suggested_fix: String::new(),
            estimated_improvement: 0.0,
        }
    }

    fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    fn with_impact(mut self, impact: f64) -> Self {
        self.impact = impact.clamp(0.0, 100.0);
        self
    }

    fn with_fix(mut self, fix: &str, estimated_improvement: f64) -> Self {
        self.suggested_fix = fix.to_string();
        self.estimated_improvement = estimated_improvement.clamp(0.0, 100.0);
        self
    }

    /// Ranking used by [`BottleneckDetector::prioritize`]: critical first,
    /// then larger impact first
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .severity
            .cmp(&self.severity)
            .then_with(|| other.impact.total_cmp(&self.impact))
    }
}

/// Bottleneck detector trait
pub trait BottleneckDetector: Send + Sync {
    /// Detects bottlenecks from samples already restricted to the scan window
    fn detect(&self, samples: &[Metric], detected_at: DateTime<Utc>) -> Vec<Bottleneck>;

    /// Prioritizes bottlenecks by severity and impact
    fn prioritize(&self, bottlenecks: &[Bottleneck]) -> Vec<Bottleneck> {
        let mut sorted = bottlenecks.to_vec();
        sorted.sort_by(Bottleneck::rank_cmp);
        sorted
    }
}

/// Default bottleneck detector: compares windowed averages against the
/// poor tier of each category's threshold
#[derive(Debug, Clone, Default)]
pub struct DefaultBottleneckDetector {
    thresholds: ThresholdTable,
}

fn category_average(samples: &[Metric], category: Category, name: &str) -> Option<f64> {
    let own: Vec<Metric> = samples
        .iter()
        .filter(|m| m.category == category)
        .cloned()
        .collect();
    average(&own, name)
}

impl DefaultBottleneckDetector {
    /// Creates a detector with the given thresholds
    pub fn new(thresholds: ThresholdTable) -> Self {
        Self { thresholds }
    }

    /// Checks for a frame-rate bottleneck
    fn check_rendering(&self, samples: &[Metric], at: DateTime<Utc>) -> Option<Bottleneck> {
        let avg_fps = category_average(samples, Category::Rendering, names::FPS)?;
        if !self.thresholds.rendering.is_poor(avg_fps) {
            return None;
        }

        let severity = if avg_fps < 20.0 {
            Severity::Critical
        } else {
            Severity::High
        };

        Some(
            Bottleneck::new(Category::Rendering, names::FPS, BottleneckType::Component, severity, at)
                .with_description(format!("Low frame rate detected: {:.1} fps average", avg_fps))
                .with_impact(100.0 - avg_fps / TARGET_FPS * 100.0)
                .with_fix(
                    "Optimize the render cycle: memoize expensive components, virtualize long lists and move heavy work off the UI thread",
                    40.0,
                ),
        )
    }

    /// Checks for a memory bottleneck
    fn check_memory(&self, samples: &[Metric], at: DateTime<Utc>) -> Option<Bottleneck> {
        let avg_usage = category_average(samples, Category::Memory, names::MEMORY_USAGE)?;
        if !self.thresholds.memory.is_poor(avg_usage) {
            return None;
        }

        let severity = if avg_usage > 95.0 {
            Severity::Critical
        } else {
            Severity::High
        };

        Some(
            Bottleneck::new(
                Category::Memory,
                names::MEMORY_USAGE,
                BottleneckType::Memory,
                severity,
                at,
            )
            .with_description(format!("High memory usage detected: {:.1}%", avg_usage))
            .with_impact(avg_usage - 50.0)
            .with_fix(
                "Bound in-memory caches, release image and list resources when screens unmount, and look for leaked subscriptions",
                30.0,
            ),
        )
    }

    /// Checks for a network latency bottleneck
    fn check_network(&self, samples: &[Metric], at: DateTime<Utc>) -> Option<Bottleneck> {
        let avg_latency = category_average(samples, Category::Network, names::LATENCY)?;
        if !self.thresholds.network.is_poor(avg_latency) {
            return None;
        }

        let severity = if avg_latency > 3000.0 {
            Severity::Critical
        } else {
            Severity::Medium
        };

        Some(
            Bottleneck::new(Category::Network, names::LATENCY, BottleneckType::Network, severity, at)
                .with_description(format!(
                    "Slow network requests detected: {:.0}ms average",
                    avg_latency
                ))
                .with_impact(avg_latency / 1000.0 * 20.0)
                .with_fix(
                    "Cache responses, reduce payload sizes and batch or deduplicate requests",
                    50.0,
                ),
        )
    }

    /// Checks for an interaction latency bottleneck
    fn check_interaction(&self, samples: &[Metric], at: DateTime<Utc>) -> Option<Bottleneck> {
        let avg_latency =
            category_average(samples, Category::UserInteraction, names::INTERACTION_LATENCY)?;
        if !self.thresholds.interaction.is_poor(avg_latency) {
            return None;
        }

        let severity = if avg_latency > 500.0 {
            Severity::Critical
        } else {
            Severity::Medium
        };

        Some(
            Bottleneck::new(
                Category::UserInteraction,
                names::INTERACTION_LATENCY,
                BottleneckType::Computation,
                severity,
                at,
            )
            .with_description(format!(
                "Slow interaction response detected: {:.0}ms average",
                avg_latency
            ))
            .with_impact(avg_latency / 200.0 * 50.0)
            .with_fix(
                "Defer non-urgent work out of input handlers and split long synchronous tasks",
                35.0,
            ),
        )
    }

    /// Checks for a slow load bottleneck
    fn check_bundle(&self, samples: &[Metric], at: DateTime<Utc>) -> Option<Bottleneck> {
        let avg_load = category_average(samples, Category::Bundle, names::LOAD_TIME)?;
        if !self.thresholds.bundle.is_poor(avg_load) {
            return None;
        }

        let severity = if avg_load > 10_000.0 {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(
            Bottleneck::new(Category::Bundle, names::LOAD_TIME, BottleneckType::Io, severity, at)
                .with_description(format!("Slow load detected: {:.0}ms average", avg_load))
                .with_impact(avg_load / 100.0)
                .with_fix(
                    "Split the bundle, lazy-load rarely used screens and trim unused dependencies",
                    25.0,
                ),
        )
    }
}

impl BottleneckDetector for DefaultBottleneckDetector {
    fn detect(&self, samples: &[Metric], detected_at: DateTime<Utc>) -> Vec<Bottleneck> {
        let checks = [
            self.check_rendering(samples, detected_at),
            self.check_memory(samples, detected_at),
            self.check_network(samples, detected_at),
            self.check_interaction(samples, detected_at),
            self.check_bundle(samples, detected_at),
        ];

        let found: Vec<Bottleneck> = checks.into_iter().flatten().collect();
        self.prioritize(&found)
    }
}
