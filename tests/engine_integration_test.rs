//! Integration tests for the performance telemetry engine

use chrono::Duration;
use perf_telemetry::{
    AppInfo, Category, DeviceInfo, EngineConfig, Error, ManualClock, NewMetric, PerformanceEngine,
    Priority, Severity, StaticEnvironment, TrendDirection, Unit,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn engine_with_clock() -> (PerformanceEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let engine = PerformanceEngine::with_clock(EngineConfig::default(), clock.clone()).unwrap();
    (engine, clock)
}

fn fps(value: f64) -> NewMetric {
    NewMetric::new(Category::Rendering, "fps", value, Unit::Fps)
}

fn memory(usage: f64) -> NewMetric {
    NewMetric::new(Category::Memory, "usage_percentage", usage, Unit::Percentage)
}

#[test]
fn test_buffer_evicts_oldest_samples() {
    let (engine, _clock) = engine_with_clock();

    for i in 0..150 {
        engine.ingest(fps(i as f64)).unwrap();
    }

    let stored = engine.metrics(Category::Rendering, None);
    assert_eq!(stored.len(), 100);
    assert_eq!(stored[0].value, 50.0);
    assert_eq!(stored[99].value, 149.0);
}

#[test]
fn test_buffers_are_per_category() {
    let (engine, _clock) = engine_with_clock();

    for _ in 0..120 {
        engine.ingest(fps(60.0)).unwrap();
    }
    engine.ingest(memory(40.0)).unwrap();

    assert_eq!(engine.metrics(Category::Memory, None).len(), 1);
    assert_eq!(engine.metric_count(), 101);

    let summary = engine.summary();
    assert_eq!(summary.total_metrics, 101);
    assert_eq!(summary.categories.get(&Category::Rendering), Some(&100));
}

#[test]
fn test_analyze_without_samples() {
    let (engine, _clock) = engine_with_clock();
    let analysis = engine.analyze(None);

    assert_eq!(analysis.overall_score, 100.0);
    assert!(analysis.critical_issues.is_empty());
    assert_eq!(analysis.recommendations.len(), 1);
    assert!(analysis.recommendations[0].contains("No performance data"));
}

#[test]
fn test_frame_rate_above_target_scores_full() {
    let (engine, _clock) = engine_with_clock();
    engine.ingest(fps(90.0)).unwrap();

    let analysis = engine.analyze(None);
    assert_eq!(analysis.category_scores.get(&Category::Rendering), Some(&100.0));
    assert_eq!(analysis.overall_score, 100.0);
}

#[test]
fn test_constant_series_trend_is_stable() {
    let (engine, clock) = engine_with_clock();
    for _ in 0..6 {
        engine.ingest(fps(50.0)).unwrap();
        clock.advance(Duration::seconds(1));
    }

    let analysis = engine.analyze(None);
    let trend = analysis.trends.iter().find(|t| t.metric == "fps").unwrap();
    assert_eq!(trend.direction, TrendDirection::Stable);
    assert_eq!(trend.confidence, 0.0);
}

#[test]
fn test_low_frame_rate_is_critical_bottleneck() {
    let (engine, _clock) = engine_with_clock();
    for _ in 0..10 {
        engine.ingest(fps(15.0)).unwrap();
    }

    let bottlenecks = engine.detect_bottlenecks(None);
    assert_eq!(bottlenecks.len(), 1);

    let rendering = &bottlenecks[0];
    assert_eq!(rendering.severity, Severity::Critical);
    assert!(rendering.impact > 50.0);
    assert!(rendering.affected_metrics.contains(&"fps".to_string()));
    assert_eq!(engine.bottlenecks().len(), 1);
}

#[test]
fn test_bottlenecks_are_ordered_by_severity() {
    let (engine, _clock) = engine_with_clock();
    engine.ingest(fps(25.0)).unwrap();
    engine.ingest(memory(97.0)).unwrap();
    engine
        .ingest(NewMetric::new(Category::Network, "latency", 1500.0, Unit::Ms))
        .unwrap();

    let bottlenecks = engine.detect_bottlenecks(Some(60_000));
    let severities: Vec<Severity> = bottlenecks.iter().map(|b| b.severity).collect();
    assert_eq!(
        severities,
        vec![Severity::Critical, Severity::High, Severity::Medium]
    );
}

#[test]
fn test_ux_score_from_frame_rate_only() {
    let (engine, _clock) = engine_with_clock();
    engine.ingest(fps(30.0)).unwrap();

    assert!((engine.compute_ux_score() - 50.0).abs() < 1e-9);

    let breakdown = engine.ux_breakdown();
    assert_eq!(breakdown.fps, Some(50.0));
    assert!(breakdown.memory.is_none());
}

#[test]
fn test_ux_score_ignores_samples_outside_window() {
    let (engine, clock) = engine_with_clock();
    engine.ingest(fps(10.0)).unwrap();
    clock.advance(Duration::minutes(2));

    assert_eq!(engine.compute_ux_score(), 100.0);
}

#[test]
fn test_recommendations_order_by_priority() {
    let (engine, _clock) = engine_with_clock();
    // rendering 45, memory 65
    engine.ingest(fps(27.0)).unwrap();
    engine.ingest(memory(35.0)).unwrap();
    engine.analyze(None);

    let recs = engine.recommendations();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].category, Category::Rendering);
    assert_eq!(recs[0].priority, Priority::Critical);
    assert_eq!(recs[1].category, Category::Memory);
    assert_eq!(recs[1].priority, Priority::High);
}

#[test]
fn test_failing_subscribers_do_not_block_delivery() {
    let (engine, _clock) = engine_with_clock();
    let received = Arc::new(AtomicUsize::new(0));

    engine.subscribe(|_| Err(Error::Subscriber("sink unavailable".to_string())));
    engine.subscribe(|_| panic!("overlay crashed"));
    let counter = received.clone();
    engine.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    for _ in 0..3 {
        engine.ingest(fps(60.0)).unwrap();
    }

    assert_eq!(received.load(Ordering::SeqCst), 3);
    assert_eq!(engine.metric_count(), 3);
}

#[test]
fn test_unsubscribed_observer_stops_receiving() {
    let (engine, _clock) = engine_with_clock();
    let received = Arc::new(AtomicUsize::new(0));

    let counter = received.clone();
    let subscription = engine.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    engine.ingest(fps(60.0)).unwrap();
    assert!(subscription.unsubscribe());
    engine.ingest(fps(60.0)).unwrap();

    assert_eq!(received.load(Ordering::SeqCst), 1);
    assert_eq!(engine.subscriber_count(), 0);
}

#[test]
fn test_report_covers_last_day_only() {
    let (engine, clock) = engine_with_clock();

    engine.ingest(fps(20.0)).unwrap();
    clock.advance(Duration::hours(25));
    engine.ingest(fps(55.0)).unwrap();
    engine.ingest(memory(50.0)).unwrap();

    let env = StaticEnvironment::new(
        DeviceInfo {
            platform: "android".to_string(),
            os_version: "14".to_string(),
            model: Some("Pixel 8".to_string()),
            ..DeviceInfo::default()
        },
        AppInfo {
            name: "letters".to_string(),
            version: "2.0.1".to_string(),
            build: Some("412".to_string()),
            environment: "production".to_string(),
        },
    );

    let report = engine.generate_report(&env);
    assert_eq!(report.metrics.len(), 2);
    assert!(report
        .metrics
        .iter()
        .all(|m| report.time_range.contains(m.timestamp)));
    assert_eq!(report.analysis.sample_count, 2);
    assert!(report.bottlenecks.is_empty());
    assert_eq!(report.device_info.model.as_deref(), Some("Pixel 8"));
    assert_eq!(report.app_info.environment, "production");
    assert_eq!(report.generated_at, engine.now());
}

#[test]
fn test_report_serializes_to_json() {
    let (engine, _clock) = engine_with_clock();
    engine.ingest(fps(45.0).with_metadata("screen", "inbox")).unwrap();

    let report = engine.generate_report(&StaticEnvironment::default());
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["metrics"][0]["category"], "rendering");
    assert_eq!(json["metrics"][0]["metadata"]["screen"], "inbox");
    assert!(json["analysis"]["overall_score"].is_number());
}

#[test]
fn test_summary_reflects_latest_state() {
    let (engine, _clock) = engine_with_clock();
    for _ in 0..4 {
        engine.ingest(fps(12.0)).unwrap();
    }
    engine.analyze(None);
    engine.detect_bottlenecks(Some(60_000));

    let summary = engine.summary();
    assert_eq!(summary.critical_bottleneck_count, 1);
    assert_eq!(summary.total_metrics, 4);
    assert!(summary.last_analysis.is_some());
    assert!((summary.ux_score - 20.0).abs() < 1e-9);
}

#[test]
fn test_concurrent_ingestion() {
    let engine = Arc::new(PerformanceEngine::new(EngineConfig::default()).unwrap());
    let received = Arc::new(AtomicUsize::new(0));
    let counter = received.clone();
    engine.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let categories = [Category::Rendering, Category::Memory, Category::Network, Category::Custom];
    let handles: Vec<_> = categories
        .iter()
        .map(|category| {
            let engine = engine.clone();
            let category = *category;
            thread::spawn(move || {
                for i in 0..50 {
                    engine
                        .ingest(NewMetric::new(category, "samples", i as f64, Unit::Count))
                        .unwrap();
                    if i % 10 == 0 {
                        engine.analyze(None);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.metric_count(), 200);
    assert_eq!(received.load(Ordering::SeqCst), 200);
    assert!(engine.analysis_history().len() <= 20);
}

#[test]
fn test_oversized_report_window_is_rejected() {
    let config = EngineConfig {
        report_window_ms: i64::MAX as u64,
        ..EngineConfig::default()
    };
    assert!(matches!(PerformanceEngine::new(config), Err(Error::Config(_))));
}

#[test]
fn test_largest_windows_do_not_overflow() {
    let clock = Arc::new(ManualClock::default());
    let config = EngineConfig {
        report_window_ms: perf_telemetry::config::MAX_WINDOW_MS,
        ..EngineConfig::default()
    };
    let engine = PerformanceEngine::with_clock(config, clock.clone()).unwrap();
    engine.ingest(fps(15.0)).unwrap();
    clock.advance(Duration::days(30));

    let report = engine.generate_report(&StaticEnvironment::default());
    assert_eq!(report.metrics.len(), 1);

    assert_eq!(engine.analyze(Some(i64::MAX as u64)).sample_count, 1);
    assert_eq!(engine.detect_bottlenecks(Some(u64::MAX)).len(), 1);
}
