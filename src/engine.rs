//! Performance telemetry engine
//!
//! `PerformanceEngine` owns every piece of mutable state (sample buffers,
//! observers, analysis history, bottleneck table). Only [`PerformanceEngine::ingest`]
//! writes samples; every analysis path works on a snapshot copied out under
//! a short read lock, so analysis never blocks ingestion for longer than the
//! copy.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::{
    ux_breakdown, Analysis, Bottleneck, BottleneckDetector, DefaultBottleneckDetector,
    DefaultPerformanceAnalyzer, DefaultRecommendationEngine, PerformanceAnalyzer, Recommendation,
    RecommendationEngine, Severity, TimeRange, UxBreakdown, UxWeights,
};
use crate::bus::{Subscription, SubscriptionBus, SubscriptionId};
use crate::clock::{Clock, SystemClock};
use crate::config::{window, EngineConfig};
use crate::error::Result;
use crate::metrics::{Category, Metric, MetricId, MetricStore, NewMetric, Unit};
use crate::report::{assemble_report, EnvironmentProvider, Report};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Start of a window of length `span` ending at `end`, clamped to the
/// earliest representable instant
fn window_start(end: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    end.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Lightweight overview for health indicators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSummary {
    pub ux_score: f64,
    pub last_analysis: Option<Analysis>,
    pub critical_bottleneck_count: usize,
    pub total_metrics: usize,
    /// Stored sample count per non-empty category
    pub categories: BTreeMap<Category, usize>,
}

/// In-process performance telemetry engine
pub struct PerformanceEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    store: RwLock<MetricStore>,
    bus: SubscriptionBus,
    history: RwLock<VecDeque<Analysis>>,
    bottlenecks: RwLock<HashMap<String, Bottleneck>>,
    analyzer: Box<dyn PerformanceAnalyzer>,
    detector: Box<dyn BottleneckDetector>,
    recommender: Box<dyn RecommendationEngine>,
}

impl PerformanceEngine {
    /// Creates an engine driven by the system clock
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an engine driven by `clock`
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            store: RwLock::new(MetricStore::new(config.buffer_capacity)),
            bus: SubscriptionBus::new(),
            history: RwLock::new(VecDeque::with_capacity(config.analysis_history_capacity)),
            bottlenecks: RwLock::new(HashMap::new()),
            analyzer: Box::new(DefaultPerformanceAnalyzer::new(config.trend_polarity)),
            detector: Box::new(DefaultBottleneckDetector::new(config.thresholds.clone())),
            recommender: Box::new(DefaultRecommendationEngine::new()),
            clock,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates and stores a sample, then notifies every observer.
    ///
    /// Observers run after the store lock is released. A failing observer is
    /// logged and never affects the returned id.
    pub fn ingest(&self, sample: NewMetric) -> Result<MetricId> {
        sample.validate()?;

        // stamped under the write lock so buffer order matches timestamp order
        let metric = {
            let mut store = write(&self.store);
            let metric = sample.into_metric(self.clock.now());
            store.push(metric.clone());
            metric
        };
        let id = metric.id;
        debug!(
            category = %metric.category,
            name = %metric.name,
            value = metric.value,
            "metric ingested"
        );

        self.bus.publish(&metric);
        Ok(id)
    }

    /// Registers an observer of newly ingested samples
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Metric) -> Result<()> + Send + Sync + 'static,
    {
        self.bus.subscribe(callback)
    }

    /// Removes an observer by id
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.len()
    }

    /// Stored samples of one category, optionally limited to the last
    /// `window_ms` milliseconds
    pub fn metrics(&self, category: Category, window_ms: Option<u64>) -> Vec<Metric> {
        let store = read(&self.store);
        match window_ms {
            Some(ms) => store.category_since(category, window_start(self.clock.now(), window(ms))),
            None => store.category(category),
        }
    }

    /// Every stored sample
    pub fn all_metrics(&self) -> Vec<Metric> {
        read(&self.store).all()
    }

    pub fn metric_count(&self) -> usize {
        read(&self.store).len()
    }

    fn range_ending_now(&self, span: Duration) -> TimeRange {
        let end = self.clock.now();
        TimeRange::new(window_start(end, span), end)
    }

    fn snapshot(&self, range: TimeRange) -> Vec<Metric> {
        let store = read(&self.store);
        store
            .since(range.start)
            .into_iter()
            .filter(|m| m.timestamp <= range.end)
            .collect()
    }

    /// Scores the last `time_range_ms` milliseconds (default: configured
    /// analysis window) and records the result in the analysis history
    pub fn analyze(&self, time_range_ms: Option<u64>) -> Analysis {
        let span = time_range_ms.map_or_else(|| self.config.analysis_window(), window);
        self.analyze_range(self.range_ending_now(span))
    }

    fn analyze_range(&self, range: TimeRange) -> Analysis {
        let samples = self.snapshot(range);
        let analysis = self.analyzer.analyze(&samples, range);

        info!(
            overall_score = analysis.overall_score,
            samples = analysis.sample_count,
            critical_issues = analysis.critical_issues.len(),
            "performance analysis completed"
        );

        let mut history = write(&self.history);
        if history.len() >= self.config.analysis_history_capacity {
            history.pop_front();
        }
        history.push_back(analysis.clone());

        analysis
    }

    /// Scans the last `time_range_ms` milliseconds (default: configured
    /// bottleneck window) for bottlenecks. The result replaces the
    /// bottleneck table.
    pub fn detect_bottlenecks(&self, time_range_ms: Option<u64>) -> Vec<Bottleneck> {
        let span = time_range_ms.map_or_else(|| self.config.bottleneck_window(), window);
        self.detect_range(self.range_ending_now(span))
    }

    fn detect_range(&self, range: TimeRange) -> Vec<Bottleneck> {
        let samples = self.snapshot(range);
        let found = self.detector.detect(&samples, range.end);

        if !found.is_empty() {
            info!(count = found.len(), "bottlenecks detected");
        }

        let mut table = write(&self.bottlenecks);
        table.clear();
        for bottleneck in &found {
            table.insert(bottleneck.id.clone(), bottleneck.clone());
        }

        found
    }

    /// Bottlenecks from the most recent scan, critical first
    pub fn bottlenecks(&self) -> Vec<Bottleneck> {
        let current: Vec<Bottleneck> = read(&self.bottlenecks).values().cloned().collect();
        self.detector.prioritize(&current)
    }

    /// Composite UX score over the configured UX window
    pub fn compute_ux_score(&self) -> f64 {
        self.ux_breakdown().score
    }

    /// UX score with its sub-scores
    pub fn ux_breakdown(&self) -> UxBreakdown {
        let range = self.range_ending_now(self.config.ux_window());
        ux_breakdown(&self.snapshot(range), &UxWeights::default())
    }

    /// Prioritized recommendations from the latest analysis. Runs an
    /// analysis first when none has been recorded yet.
    pub fn recommendations(&self) -> Vec<Recommendation> {
        let analysis = match self.last_analysis() {
            Some(analysis) => analysis,
            None => self.analyze(None),
        };
        self.recommender
            .generate_recommendations(&analysis.category_scores)
    }

    /// Analysis, bottlenecks and raw samples of the report window, with the
    /// host's environment descriptors attached
    pub fn generate_report(&self, environment: &dyn EnvironmentProvider) -> Report {
        let range = self.range_ending_now(self.config.report_window());

        let analysis = self.analyze_range(range);
        let bottlenecks = self.detect_range(range);
        let samples = self.snapshot(range);

        let report = assemble_report(range, analysis, bottlenecks, samples, environment);
        info!(
            report_id = %report.id,
            metrics = report.metrics.len(),
            bottlenecks = report.bottlenecks.len(),
            "performance report generated"
        );
        report
    }

    /// Overview for health indicators
    pub fn summary(&self) -> EngineSummary {
        let (total_metrics, categories) = {
            let store = read(&self.store);
            (store.len(), store.counts())
        };
        let critical_bottleneck_count = read(&self.bottlenecks)
            .values()
            .filter(|b| b.severity == Severity::Critical)
            .count();

        EngineSummary {
            ux_score: self.compute_ux_score(),
            last_analysis: self.last_analysis(),
            critical_bottleneck_count,
            total_metrics,
            categories,
        }
    }

    /// Recorded analyses, oldest first
    pub fn analysis_history(&self) -> Vec<Analysis> {
        read(&self.history).iter().cloned().collect()
    }

    pub fn last_analysis(&self) -> Option<Analysis> {
        read(&self.history).back().cloned()
    }

    /// Drops samples, analysis history and bottlenecks. Observers stay
    /// registered.
    pub fn clear(&self) {
        write(&self.store).clear();
        write(&self.history).clear();
        write(&self.bottlenecks).clear();
        info!("performance data cleared");
    }

    /// Starts timing an operation; [`MetricTimer::stop`] ingests the
    /// elapsed milliseconds
    pub fn start_timer(&self, category: Category, name: impl Into<String>) -> MetricTimer<'_> {
        MetricTimer {
            engine: self,
            sample: NewMetric::new(category, name, 0.0, Unit::Ms),
            started: Instant::now(),
        }
    }

    /// Runs `f` and ingests its duration in milliseconds. The name is
    /// validated before `f` runs.
    pub fn measure<R>(&self, category: Category, name: &str, f: impl FnOnce() -> R) -> Result<R> {
        NewMetric::new(category, name, 0.0, Unit::Ms).validate()?;

        let timer = self.start_timer(category, name);
        let result = f();
        timer.stop()?;
        Ok(result)
    }

    /// Current time according to the engine clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

/// Running timer created by [`PerformanceEngine::start_timer`]
pub struct MetricTimer<'a> {
    engine: &'a PerformanceEngine,
    sample: NewMetric,
    started: Instant,
}

impl MetricTimer<'_> {
    /// Adds a metadata entry to the eventual sample
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.sample = self.sample.with_metadata(key, value);
        self
    }

    /// Adds a tag to the eventual sample
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.sample = self.sample.with_tag(tag);
        self
    }

    /// Stops the timer and ingests the elapsed milliseconds
    pub fn stop(self) -> Result<MetricId> {
        let mut sample = self.sample;
        sample.value = self.started.elapsed().as_secs_f64() * 1000.0;
        self.engine.ingest(sample)
    }
}
