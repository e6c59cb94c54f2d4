//! Performance analysis: category scores, trends and plain-text findings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::TrendPolarity;
use crate::metrics::{Category, Metric};

use super::scoring::{category_scores, overall_score};
use super::trend::{Trend, TrendAnalyzer, TrendDirection};

/// Category score below which a critical issue is raised
pub const CRITICAL_SCORE: f64 = 50.0;

/// Category score below which a hint is added
pub const ATTENTION_SCORE: f64 = 70.0;

/// Trend confidence at which a degrading trend is called out
pub const TREND_ALERT_CONFIDENCE: f64 = 50.0;

/// Hint returned when the window holds no samples
pub const NO_DATA_HINT: &str =
    "No performance data collected yet. Instrument rendering, memory and network paths to enable analysis.";

/// Closed time interval
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `at` falls inside the range, bounds included
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Scored snapshot of one analysis window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    /// 0-100, mean of the present category scores
    pub overall_score: f64,
    pub category_scores: BTreeMap<Category, f64>,
    pub trends: Vec<Trend>,
    /// Plain-text hints
    pub recommendations: Vec<String>,
    /// Plain-text flags
    pub critical_issues: Vec<String>,
    pub summary: String,
    pub time_range: TimeRange,
    pub sample_count: usize,
    pub analyzed_at: DateTime<Utc>,
}

/// Performance analyzer trait
pub trait PerformanceAnalyzer: Send + Sync {
    /// Analyzes samples already restricted to `time_range`
    fn analyze(&self, samples: &[Metric], time_range: TimeRange) -> Analysis;
}

/// Default performance analyzer implementation
#[derive(Debug, Clone, Default)]
pub struct DefaultPerformanceAnalyzer {
    trend_analyzer: TrendAnalyzer,
}

impl DefaultPerformanceAnalyzer {
    /// Creates a new analyzer with the given trend polarity
    pub fn new(polarity: TrendPolarity) -> Self {
        Self {
            trend_analyzer: TrendAnalyzer::new(polarity),
        }
    }

    /// Generates analysis summary
    fn generate_summary(&self, overall: f64, critical_count: usize, sample_count: usize) -> String {
        let health = if overall >= 90.0 {
            "excellent"
        } else if overall >= 70.0 {
            "good"
        } else if overall >= 50.0 {
            "fair"
        } else {
            "poor"
        };

        let mut summary = format!(
            "Performance is {} with an overall score of {:.1} across {} sample(s).",
            health, overall, sample_count
        );
        if critical_count > 0 {
            summary.push_str(&format!(
                " {} critical issue(s) need immediate attention.",
                critical_count
            ));
        }
        summary
    }

    fn score_findings(
        &self,
        scores: &BTreeMap<Category, f64>,
        critical_issues: &mut Vec<String>,
        hints: &mut Vec<String>,
    ) {
        for (category, score) in scores {
            if *score < CRITICAL_SCORE {
                critical_issues.push(format!(
                    "{} performance is critical (score {:.1})",
                    category, score
                ));
            }
            if *score < ATTENTION_SCORE {
                hints.push(category_hint(*category).to_string());
            }
        }
    }

    fn trend_findings(&self, trends: &[Trend], hints: &mut Vec<String>) {
        for trend in trends {
            if trend.direction == TrendDirection::Degrading
                && trend.confidence >= TREND_ALERT_CONFIDENCE
            {
                hints.push(format!(
                    "'{}' is degrading ({:+.1}% between halves of the window); investigate recent changes",
                    trend.metric, trend.change_percent
                ));
            }
        }
    }
}

fn category_hint(category: Category) -> &'static str {
    match category {
        Category::Rendering => {
            "Reduce render work: memoize components and virtualize long lists to recover frame rate"
        }
        Category::Memory => "Lower memory pressure: cap caches and release resources of unmounted screens",
        Category::Network => "Cut network latency: cache responses and shrink request payloads",
        Category::UserInteraction => "Keep input handlers short and defer non-urgent work",
        Category::Bundle => "Shrink the bundle and lazy-load screens not needed at startup",
        Category::Custom => "Review custom metrics that fall below their targets",
    }
}

impl PerformanceAnalyzer for DefaultPerformanceAnalyzer {
    fn analyze(&self, samples: &[Metric], time_range: TimeRange) -> Analysis {
        if samples.is_empty() {
            return Analysis {
                overall_score: overall_score(&BTreeMap::new()),
                category_scores: BTreeMap::new(),
                trends: Vec::new(),
                recommendations: vec![NO_DATA_HINT.to_string()],
                critical_issues: Vec::new(),
                summary: "No performance data available for the requested window.".to_string(),
                time_range,
                sample_count: 0,
                analyzed_at: time_range.end,
            };
        }

        let scores = category_scores(samples);
        let overall = overall_score(&scores);
        let trends = self.trend_analyzer.analyze_all(samples);

        let mut critical_issues = Vec::new();
        let mut hints = Vec::new();
        self.score_findings(&scores, &mut critical_issues, &mut hints);
        self.trend_findings(&trends, &mut hints);

        let summary = self.generate_summary(overall, critical_issues.len(), samples.len());

        Analysis {
            overall_score: overall,
            category_scores: scores,
            trends,
            recommendations: hints,
            critical_issues,
            summary,
            time_range,
            sample_count: samples.len(),
            analyzed_at: time_range.end,
        }
    }
}
