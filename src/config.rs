//! エンジン設定
//!
//! Defaults, optional TOML file and `PERF_` environment overrides, layered
//! with the `config` crate.

use chrono::Duration;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::metrics::DEFAULT_BUFFER_CAPACITY;

/// Three-tier threshold for one metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Tier {
    pub excellent: f64,
    pub good: f64,
    pub poor: f64,
}

/// Where a value falls against a [`Tier`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
}

impl Tier {
    pub const fn new(excellent: f64, good: f64, poor: f64) -> Self {
        Self {
            excellent,
            good,
            poor,
        }
    }

    /// Whether larger values are better for this tier (e.g. fps)
    pub fn higher_is_better(&self) -> bool {
        self.excellent > self.poor
    }

    /// Rates `value` against the tier
    pub fn rate(&self, value: f64) -> Rating {
        let at_least = |bound: f64| {
            if self.higher_is_better() {
                value >= bound
            } else {
                value <= bound
            }
        };

        if at_least(self.excellent) {
            Rating::Excellent
        } else if at_least(self.good) {
            Rating::Good
        } else if at_least(self.poor) {
            Rating::NeedsImprovement
        } else {
            Rating::Poor
        }
    }

    /// Whether `value` is past the poor bound
    pub fn is_poor(&self, value: f64) -> bool {
        self.rate(value) == Rating::Poor
    }

    fn validate(&self, label: &str) -> Result<()> {
        let bounds = [self.excellent, self.good, self.poor];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(Error::Config(format!("{} thresholds must be finite", label)));
        }

        let monotone = if self.higher_is_better() {
            self.excellent >= self.good && self.good >= self.poor
        } else {
            self.excellent <= self.good && self.good <= self.poor
        };
        if !monotone || self.excellent == self.poor {
            return Err(Error::Config(format!(
                "{} thresholds must be ordered excellent -> good -> poor",
                label
            )));
        }
        Ok(())
    }
}

/// Per-category thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdTable {
    /// rendering / fps
    pub rendering: Tier,
    /// memory / usage_percentage
    pub memory: Tier,
    /// network / latency (ms)
    pub network: Tier,
    /// bundle / load_time (ms)
    pub bundle: Tier,
    /// user_interaction / interaction_latency (ms)
    pub interaction: Tier,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            rendering: Tier::new(55.0, 45.0, 30.0),
            memory: Tier::new(50.0, 70.0, 85.0),
            network: Tier::new(200.0, 500.0, 1000.0),
            bundle: Tier::new(1000.0, 3000.0, 5000.0),
            interaction: Tier::new(50.0, 100.0, 200.0),
        }
    }
}

impl ThresholdTable {
    fn validate(&self) -> Result<()> {
        self.rendering.validate("rendering")?;
        self.memory.validate("memory")?;
        self.network.validate("network")?;
        self.bundle.validate("bundle")?;
        self.interaction.validate("interaction")
    }
}

/// How trend direction maps to improving/degrading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendPolarity {
    /// Rising values are always "improving", for every metric
    #[default]
    Literal,
    /// Rising values of lower-is-better metrics (latency, usage, load time)
    /// are "degrading"
    MetricAware,
}

/// Largest accepted analysis window (one year)
pub const MAX_WINDOW_MS: u64 = 366 * 24 * 60 * 60 * 1000;

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Samples kept per category
    pub buffer_capacity: usize,
    /// Analyses kept in history
    pub analysis_history_capacity: usize,
    /// Default window for `analyze` (ms)
    pub analysis_window_ms: u64,
    /// Default window for bottleneck scans (ms)
    pub bottleneck_window_ms: u64,
    /// Window for the UX score (ms)
    pub ux_window_ms: u64,
    /// Window covered by reports (ms)
    pub report_window_ms: u64,
    pub trend_polarity: TrendPolarity,
    pub thresholds: ThresholdTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            analysis_history_capacity: 20,
            analysis_window_ms: 5 * 60 * 1000,
            bottleneck_window_ms: 5 * 60 * 1000,
            ux_window_ms: 60 * 1000,
            report_window_ms: 24 * 60 * 60 * 1000,
            trend_polarity: TrendPolarity::default(),
            thresholds: ThresholdTable::default(),
        }
    }
}

impl EngineConfig {
    /// 設定値の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(Error::Config("buffer_capacity must be positive".to_string()));
        }
        if self.analysis_history_capacity == 0 {
            return Err(Error::Config(
                "analysis_history_capacity must be positive".to_string(),
            ));
        }

        let windows = [
            ("analysis_window_ms", self.analysis_window_ms),
            ("bottleneck_window_ms", self.bottleneck_window_ms),
            ("ux_window_ms", self.ux_window_ms),
            ("report_window_ms", self.report_window_ms),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, ms)| *ms == 0) {
            return Err(Error::Config(format!("{} must be positive", name)));
        }
        if let Some((name, ms)) = windows.iter().find(|(_, ms)| *ms > MAX_WINDOW_MS) {
            return Err(Error::Config(format!(
                "{} must not exceed {} ms (got {})",
                name, MAX_WINDOW_MS, ms
            )));
        }

        self.thresholds.validate()
    }

    pub fn analysis_window(&self) -> Duration {
        window(self.analysis_window_ms)
    }

    pub fn bottleneck_window(&self) -> Duration {
        window(self.bottleneck_window_ms)
    }

    pub fn ux_window(&self) -> Duration {
        window(self.ux_window_ms)
    }

    pub fn report_window(&self) -> Duration {
        window(self.report_window_ms)
    }
}

/// Converts a millisecond window into a duration, saturating at
/// `Duration::MAX`
pub fn window(ms: u64) -> Duration {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or(Duration::MAX)
}

/// Configuration loader with builder pattern
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_file: Option<String>,
    load_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from file (format inferred from the extension)
    pub fn load_from_file(mut self, path: Option<&str>) -> Self {
        self.config_file = path.map(String::from);
        self
    }

    /// Load configuration from `PERF_` environment variables, nested keys
    /// separated by `__` (e.g. `PERF_THRESHOLDS__NETWORK__POOR`)
    pub fn load_from_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Build and validate the final configuration
    pub fn build(self) -> Result<EngineConfig> {
        let mut builder = Config::builder().add_source(Config::try_from(&EngineConfig::default())?);

        if let Some(config_path) = &self.config_file {
            debug!(path = %config_path, "設定ファイルを読み込み");
            builder = builder.add_source(File::with_name(config_path).required(true));
        } else {
            builder = builder
                .add_source(File::with_name("perf-telemetry").required(false))
                .add_source(File::with_name("config/perf-telemetry").required(false));
        }

        if self.load_env {
            builder = builder.add_source(
                Environment::with_prefix("PERF")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
