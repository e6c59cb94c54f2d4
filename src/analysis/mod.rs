//! Performance analysis over metric snapshots
//!
//! Every function here is a read-only computation over samples handed in by
//! the caller; none of them touch engine state.

pub mod analyzer;
pub mod bottleneck;
pub mod recommendation;
pub mod scoring;
pub mod trend;
pub mod ux;

pub use analyzer::{Analysis, DefaultPerformanceAnalyzer, PerformanceAnalyzer, TimeRange};
pub use bottleneck::{Bottleneck, BottleneckDetector, BottleneckType, DefaultBottleneckDetector, Severity};
pub use recommendation::{
    Complexity, DefaultRecommendationEngine, Priority, Recommendation, RecommendationEngine,
};
pub use scoring::{category_scores, overall_score, score_category};
pub use trend::{Trend, TrendAnalyzer, TrendDirection};
pub use ux::{ux_breakdown, ux_score, UxBreakdown, UxWeights};
