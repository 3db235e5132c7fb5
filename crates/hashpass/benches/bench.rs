use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use hashpass::{HashService, LatencyAggregator, ResultRegistry, Secret, ServiceConfig, hash_secret};
use std::{sync::Arc, thread, time::Duration};
use tokio::runtime::Builder;

const OPS_PER_ITER: u64 = 4096;

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    group.throughput(Throughput::Elements(OPS_PER_ITER));

    group.bench_function("register_publish_poll", |b| {
        let registry = ResultRegistry::new();
        b.iter(|| {
            for _ in 0..OPS_PER_ITER {
                let id = registry.register();
                registry.publish(&id, String::from("digest"));
                black_box(registry.poll(&id));
            }
        });
    });

    for threads in [2, 4, 8] {
        group.bench_function(format!("register_contended/{threads}"), |b| {
            let registry = Arc::new(ResultRegistry::new());
            b.iter(|| {
                thread::scope(|s| {
                    for _ in 0..threads {
                        let registry = Arc::clone(&registry);
                        s.spawn(move || {
                            for _ in 0..OPS_PER_ITER / threads {
                                let id = registry.register();
                                registry.publish(&id, String::new());
                                black_box(registry.poll(&id));
                            }
                        });
                    }
                });
            });
        });
    }

    group.finish();
}

fn bench_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency");
    group.throughput(Throughput::Elements(OPS_PER_ITER));
    group.bench_function("record", |b| {
        let stats = LatencyAggregator::new();
        b.iter(|| {
            for _ in 0..OPS_PER_ITER {
                stats.record(black_box(Duration::from_micros(3)));
            }
            black_box(stats.snapshot());
        });
    });
    group.finish();
}

fn bench_digest(c: &mut Criterion) {
    let secret = Secret::from("angryMonkey");
    c.bench_function("hash_secret", |b| b.iter(|| black_box(hash_secret(&secret))));
}

fn bench_submit(c: &mut Criterion) {
    let rt = Builder::new_multi_thread()
        .worker_threads(4)
        .enable_time()
        .build()
        .unwrap();
    let service = HashService::new(ServiceConfig {
        hash_delay: Duration::ZERO,
        drain_timeout: None,
    });

    c.bench_function("submit", |b| {
        b.to_async(&rt).iter(|| {
            let service = service.clone();
            async move { black_box(service.submit("angryMonkey").unwrap()) }
        });
    });
}

criterion_group!(benches, bench_registry, bench_latency, bench_digest, bench_submit);
criterion_main!(benches);
