//! Point-in-time performance reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::analysis::{Analysis, Bottleneck, TimeRange};
use crate::metrics::Metric;

/// Device descriptor supplied by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceInfo {
    pub platform: String,
    pub os_version: String,
    pub model: Option<String>,
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

/// Application descriptor supplied by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub build: Option<String>,
    /// e.g. "development", "production"
    pub environment: String,
}

/// Host capability that knows the runtime environment
pub trait EnvironmentProvider: Send + Sync {
    fn device_info(&self) -> DeviceInfo;
    fn app_info(&self) -> AppInfo;
}

/// Provider over fixed descriptors
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    pub device: DeviceInfo,
    pub app: AppInfo,
}

impl StaticEnvironment {
    pub fn new(device: DeviceInfo, app: AppInfo) -> Self {
        Self { device, app }
    }
}

impl EnvironmentProvider for StaticEnvironment {
    fn device_info(&self) -> DeviceInfo {
        self.device.clone()
    }

    fn app_info(&self) -> AppInfo {
        self.app.clone()
    }
}

/// Bundle of analysis, bottlenecks and raw samples for one window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub time_range: TimeRange,
    pub analysis: Analysis,
    pub bottlenecks: Vec<Bottleneck>,
    /// Raw samples inside `time_range`
    pub metrics: Vec<Metric>,
    pub device_info: DeviceInfo,
    pub app_info: AppInfo,
}

/// Composes a report. Samples outside `time_range` are dropped; nothing
/// else is computed here.
pub fn assemble_report(
    time_range: TimeRange,
    analysis: Analysis,
    bottlenecks: Vec<Bottleneck>,
    samples: Vec<Metric>,
    environment: &dyn EnvironmentProvider,
) -> Report {
    let metrics = samples
        .into_iter()
        .filter(|m| time_range.contains(m.timestamp))
        .collect();

    Report {
        id: Uuid::new_v4(),
        generated_at: time_range.end,
        time_range,
        analysis,
        bottlenecks,
        metrics,
        device_info: environment.device_info(),
        app_info: environment.app_info(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{DefaultPerformanceAnalyzer, PerformanceAnalyzer};
    use crate::metrics::{Category, NewMetric, Unit};
    use chrono::Duration;

    #[test]
    fn test_assemble_filters_out_of_range_samples() {
        let end = Utc::now();
        let range = TimeRange::new(end - Duration::hours(24), end);
        let samples = vec![
            NewMetric::new(Category::Network, "latency", 100.0, Unit::Ms)
                .into_metric(end - Duration::hours(25)),
            NewMetric::new(Category::Network, "latency", 200.0, Unit::Ms)
                .into_metric(end - Duration::hours(1)),
        ];
        let analysis = DefaultPerformanceAnalyzer::default().analyze(&samples[1..], range);

        let env = StaticEnvironment::new(
            DeviceInfo {
                platform: "ios".to_string(),
                os_version: "17.4".to_string(),
                ..DeviceInfo::default()
            },
            AppInfo {
                name: "letters".to_string(),
                version: "1.2.0".to_string(),
                ..AppInfo::default()
            },
        );

        let report = assemble_report(range, analysis, Vec::new(), samples, &env);
        assert_eq!(report.metrics.len(), 1);
        assert_eq!(report.metrics[0].value, 200.0);
        assert_eq!(report.generated_at, end);
        assert_eq!(report.device_info.platform, "ios");
        assert_eq!(report.app_info.version, "1.2.0");
    }
}
