//! Metric sample types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Well-known metric names read by the scoring, detection and UX paths
pub mod names {
    /// Frames per second
    pub const FPS: &str = "fps";
    /// Memory usage percentage (0-100)
    pub const MEMORY_USAGE: &str = "usage_percentage";
    /// Network round-trip latency in milliseconds
    pub const LATENCY: &str = "latency";
    /// Input-to-response latency in milliseconds
    pub const INTERACTION_LATENCY: &str = "interaction_latency";
    /// Bundle or screen load time in milliseconds
    pub const LOAD_TIME: &str = "load_time";
}

/// Coarse grouping of metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Frame rendering
    Rendering,
    /// Network round trips
    Network,
    /// Memory pressure
    Memory,
    /// Input handling
    UserInteraction,
    /// Bundle and load timings
    Bundle,
    /// Caller-defined metrics
    Custom,
}

impl Category {
    /// Every category, in declaration order
    pub const ALL: [Category; 6] = [
        Category::Rendering,
        Category::Network,
        Category::Memory,
        Category::UserInteraction,
        Category::Bundle,
        Category::Custom,
    ];

    /// Returns the category name
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Rendering => "rendering",
            Category::Network => "network",
            Category::Memory => "memory",
            Category::UserInteraction => "user_interaction",
            Category::Bundle => "bundle",
            Category::Custom => "custom",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidMetric(format!("unknown category '{}'", s)))
    }
}

/// Measurement unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Milliseconds
    Ms,
    /// Bytes
    Bytes,
    /// Frames per second
    Fps,
    /// Plain count
    Count,
    /// Percentage (0-100)
    Percentage,
}

impl Unit {
    /// Returns the unit label
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Ms => "ms",
            Unit::Bytes => "bytes",
            Unit::Fps => "fps",
            Unit::Count => "count",
            Unit::Percentage => "percentage",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ms" => Ok(Unit::Ms),
            "bytes" => Ok(Unit::Bytes),
            "fps" => Ok(Unit::Fps),
            "count" => Ok(Unit::Count),
            "percentage" => Ok(Unit::Percentage),
            other => Err(Error::InvalidMetric(format!("unknown unit '{}'", other))),
        }
    }
}

/// Opaque sample identifier assigned at ingest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MetricId(Uuid);

impl MetricId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One observed sample. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    /// Identifier assigned at ingest
    pub id: MetricId,
    /// Metric key, e.g. "fps" or "latency"
    pub name: String,
    /// Measured value
    pub value: f64,
    /// Measurement unit
    pub unit: Unit,
    /// Owning category buffer
    pub category: Category,
    /// Ingest time
    pub timestamp: DateTime<Utc>,
    /// Free-form context supplied by the producer
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Labels supplied by the producer
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// A sample as handed to the engine by an instrumentation point
#[derive(Debug, Clone, PartialEq)]
pub struct NewMetric {
    pub category: Category,
    pub name: String,
    pub value: f64,
    pub unit: Unit,
    pub metadata: HashMap<String, serde_json::Value>,
    pub tags: BTreeSet<String>,
}

impl NewMetric {
    /// Creates a new sample
    pub fn new(category: Category, name: impl Into<String>, value: f64, unit: Unit) -> Self {
        Self {
            category,
            name: name.into(),
            value,
            unit,
            metadata: HashMap::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Creates a sample from string-typed category and unit, as produced by
    /// hosts that carry them untyped
    pub fn parse(category: &str, name: impl Into<String>, value: f64, unit: &str) -> Result<Self> {
        Ok(Self::new(category.parse()?, name, value, unit.parse()?))
    }

    /// Adds a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Rejects samples that cannot be scored
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidMetric("metric name is empty".to_string()));
        }
        if !self.value.is_finite() {
            return Err(Error::InvalidMetric(format!(
                "value of '{}' is not finite: {}",
                self.name, self.value
            )));
        }
        Ok(())
    }

    pub(crate) fn into_metric(self, timestamp: DateTime<Utc>) -> Metric {
        Metric {
            id: MetricId::generate(),
            name: self.name,
            value: self.value,
            unit: self.unit,
            category: self.category,
            timestamp,
            metadata: self.metadata,
            tags: self.tags,
        }
    }
}

/// Arithmetic mean of every sample named `name`, or `None` when absent
pub fn average(metrics: &[Metric], name: &str) -> Option<f64> {
    let (sum, count) = metrics
        .iter()
        .filter(|m| m.name == name)
        .fold((0.0, 0usize), |(sum, count), m| (sum + m.value, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
