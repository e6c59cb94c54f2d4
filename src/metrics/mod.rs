//! Metric samples and their bounded storage

pub mod store;
pub mod types;

pub use store::{MetricStore, DEFAULT_BUFFER_CAPACITY};
pub use types::{average, names, Category, Metric, MetricId, NewMetric, Unit};
