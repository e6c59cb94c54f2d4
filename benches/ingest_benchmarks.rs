use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use perf_telemetry::{Category, EngineConfig, NewMetric, PerformanceEngine, Unit};
use rand::Rng;
use std::sync::Arc;
use std::thread;

/// テレメトリエンジンベンチマーク
///
/// 取り込みと分析のコストを測定します。

fn random_sample(rng: &mut impl Rng) -> NewMetric {
    match rng.gen_range(0..4) {
        0 => NewMetric::new(Category::Rendering, "fps", rng.gen_range(10.0..60.0), Unit::Fps),
        1 => NewMetric::new(
            Category::Memory,
            "usage_percentage",
            rng.gen_range(20.0..99.0),
            Unit::Percentage,
        ),
        2 => NewMetric::new(Category::Network, "latency", rng.gen_range(50.0..4000.0), Unit::Ms),
        _ => NewMetric::new(
            Category::UserInteraction,
            "interaction_latency",
            rng.gen_range(10.0..600.0),
            Unit::Ms,
        ),
    }
}

fn filled_engine(samples: usize) -> PerformanceEngine {
    let engine = PerformanceEngine::new(EngineConfig::default()).unwrap();
    let mut rng = rand::thread_rng();
    for _ in 0..samples {
        engine.ingest(random_sample(&mut rng)).unwrap();
    }
    engine
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for subscribers in [0usize, 4, 16].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            subscribers,
            |b, &subscribers| {
                let engine = PerformanceEngine::new(EngineConfig::default()).unwrap();
                for _ in 0..subscribers {
                    engine.subscribe(|m| {
                        black_box(m.value);
                        Ok(())
                    });
                }
                let mut rng = rand::thread_rng();
                b.iter(|| engine.ingest(random_sample(&mut rng)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_concurrent_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_ingest");

    for threads in [2usize, 4, 8].iter() {
        group.throughput(Throughput::Elements((*threads * 100) as u64));
        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, &threads| {
            b.iter(|| {
                let engine = Arc::new(PerformanceEngine::new(EngineConfig::default()).unwrap());
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let engine = engine.clone();
                        thread::spawn(move || {
                            let mut rng = rand::thread_rng();
                            for _ in 0..100 {
                                engine.ingest(random_sample(&mut rng)).unwrap();
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            })
        });
    }

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");

    for samples in [50usize, 200, 400].iter() {
        let engine = filled_engine(*samples);

        group.bench_with_input(BenchmarkId::new("analyze", samples), samples, |b, _| {
            b.iter(|| black_box(engine.analyze(None)))
        });
        group.bench_with_input(BenchmarkId::new("detect_bottlenecks", samples), samples, |b, _| {
            b.iter(|| black_box(engine.detect_bottlenecks(None)))
        });
        group.bench_with_input(BenchmarkId::new("ux_score", samples), samples, |b, _| {
            b.iter(|| black_box(engine.compute_ux_score()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_concurrent_ingest, bench_analysis);
criterion_main!(benches);
