//! # perf-telemetry
//!
//! In-process performance telemetry for client applications.
//!
//! Samples (frame rate, memory usage, network latency, interaction latency,
//! bundle load time, or anything custom) are ingested into bounded
//! per-category buffers. On demand the engine scores the recent window,
//! classifies per-metric trends, detects bottlenecks, computes a composite
//! user-experience score, emits prioritized recommendations and assembles
//! reports.
//!
//! ```no_run
//! use perf_telemetry::{Category, EngineConfig, NewMetric, PerformanceEngine, Unit};
//!
//! let engine = PerformanceEngine::new(EngineConfig::default())?;
//! engine.ingest(NewMetric::new(Category::Rendering, "fps", 58.0, Unit::Fps))?;
//!
//! let analysis = engine.analyze(None);
//! println!("{}", analysis.summary);
//! # Ok::<(), perf_telemetry::Error>(())
//! ```

pub mod analysis;
pub mod bus;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod report;

pub use analysis::{
    Analysis, Bottleneck, BottleneckType, Priority, Recommendation, Severity, TimeRange, Trend,
    TrendDirection, UxBreakdown,
};
pub use bus::{DispatchOutcome, Subscription, SubscriptionId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use self::config::{ConfigLoader, EngineConfig, ThresholdTable, TrendPolarity};
pub use engine::{EngineSummary, MetricTimer, PerformanceEngine};
pub use error::{Error, Result};
pub use logging::{init_logging, LogConfig};
pub use metrics::{Category, Metric, MetricId, NewMetric, Unit};
pub use report::{AppInfo, DeviceInfo, EnvironmentProvider, Report, StaticEnvironment};
