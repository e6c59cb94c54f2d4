//! Bounded per-category sample buffers

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::trace;

use super::types::{Category, Metric};

/// Default number of samples retained per category
pub const DEFAULT_BUFFER_CAPACITY: usize = 100;

/// Per-category FIFO buffers. Each category holds at most `capacity`
/// samples; pushing beyond that evicts the oldest one of that category only.
#[derive(Debug, Clone)]
pub struct MetricStore {
    capacity: usize,
    buffers: HashMap<Category, VecDeque<Metric>>,
}

impl MetricStore {
    /// Creates an empty store
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffers: HashMap::new(),
        }
    }

    /// Per-category capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a sample, returning the evicted one if the buffer was full
    pub fn push(&mut self, metric: Metric) -> Option<Metric> {
        let capacity = self.capacity;
        let buffer = self
            .buffers
            .entry(metric.category)
            .or_insert_with(|| VecDeque::with_capacity(capacity));

        let evicted = if buffer.len() >= capacity {
            buffer.pop_front()
        } else {
            None
        };

        if let Some(ref old) = evicted {
            trace!(category = %old.category, name = %old.name, "evicted oldest sample");
        }

        buffer.push_back(metric);
        evicted
    }

    /// Samples of one category, oldest first
    pub fn category(&self, category: Category) -> Vec<Metric> {
        self.buffers
            .get(&category)
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Samples of one category at or after `cutoff`
    pub fn category_since(&self, category: Category, cutoff: DateTime<Utc>) -> Vec<Metric> {
        self.buffers
            .get(&category)
            .map(|b| b.iter().filter(|m| m.timestamp >= cutoff).cloned().collect())
            .unwrap_or_default()
    }

    /// Samples of every category at or after `cutoff`, in category order
    pub fn since(&self, cutoff: DateTime<Utc>) -> Vec<Metric> {
        Category::ALL
            .iter()
            .flat_map(|c| self.category_since(*c, cutoff))
            .collect()
    }

    /// Every stored sample, in category order
    pub fn all(&self) -> Vec<Metric> {
        Category::ALL
            .iter()
            .flat_map(|c| self.category(*c))
            .collect()
    }

    /// Total number of stored samples
    pub fn len(&self) -> usize {
        self.buffers.values().map(VecDeque::len).sum()
    }

    /// Whether no samples are stored
    pub fn is_empty(&self) -> bool {
        self.buffers.values().all(VecDeque::is_empty)
    }

    /// Sample count per non-empty category
    pub fn counts(&self) -> BTreeMap<Category, usize> {
        self.buffers
            .iter()
            .filter(|(_, b)| !b.is_empty())
            .map(|(c, b)| (*c, b.len()))
            .collect()
    }

    /// Drops every sample
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}
