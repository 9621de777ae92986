use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use yocto_exporter::{
    Collector, DeviceSession, MetricsRegistry, SensorGauge, SimulatedHub, SimulatedModule,
};

fn populated_registry(modules: usize) -> MetricsRegistry {
    let registry = MetricsRegistry::new().expect("Should create registry");
    for i in 0..modules {
        let label = format!("module-{}", i);
        for gauge in SensorGauge::ALL {
            registry.set_gauge(gauge, &gauge.hardware_id(&label), i as f64);
        }
    }
    registry
}

/// Benchmark a single gauge update, the collector's hot path
fn bench_set_gauge(c: &mut Criterion) {
    let registry = populated_registry(1);

    c.bench_function("set_gauge", |b| {
        b.iter(|| registry.set_gauge(SensorGauge::Temperature, "module-0.temperature", 21.5))
    });
}

/// Benchmark text encoding, the cost of one scrape
fn bench_encode(c: &mut Criterion) {
    for modules in [1, 10, 50].iter() {
        let registry = populated_registry(*modules);
        c.bench_with_input(BenchmarkId::new("encode", modules), modules, |b, _| {
            b.iter(|| registry.encode().expect("Should encode"))
        });
    }
}

/// Benchmark a pass over modules without sensor functions (no pacing sleeps)
fn bench_module_pass(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Should create tokio runtime");

    let mut collector = rt.block_on(async {
        let modules = (0..20)
            .map(|i| SimulatedModule::new(format!("YMODULE-{:05}", i), format!("module-{}", i)))
            .collect();
        let mut hub = SimulatedHub::new(modules);
        hub.register_hub().await.expect("Should register");
        Collector::new(hub, Arc::new(MetricsRegistry::new().expect("Should create registry")))
    });

    c.bench_function("module_pass_20", |b| {
        b.iter(|| rt.block_on(collector.run_pass(false)).expect("Should complete pass"))
    });
}

criterion_group!(benches, bench_set_gauge, bench_encode, bench_module_pass);
criterion_main!(benches);
