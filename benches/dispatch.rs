//! Event dispatch benchmark suite.
//!
//! Measures the inbound hot path:
//! - Socket.IO frame decoding
//! - Registry dispatch at different callback counts
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use njspc::protocol::Packet;
use njspc::{EventRegistry, InboundEvent};
use serde_json::{Value, json};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const CALLBACK_COUNTS: &[usize] = &[1, 8, 64];

const PUMP_FRAME: &str = r#"42["pump",{"id":1,"rpm":2450,"watts":1130,"flow":48,"status":{"val":0,"name":"ok"}}]"#;

// ============================================================================
// Benchmark: Frame Decoding
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(PUMP_FRAME.len() as u64));

    group.bench_function("event_frame", |b| {
        b.iter(|| Packet::decode(black_box(PUMP_FRAME)));
    });
    group.bench_function("ping", |b| {
        b.iter(|| Packet::decode(black_box("2")));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let payload = json!({"id": 1, "rpm": 2450, "watts": 1130});

    let mut group = c.benchmark_group("dispatch");

    for &count in CALLBACK_COUNTS {
        let registry = EventRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..count {
            let hits = Arc::clone(&hits);
            registry.on(
                InboundEvent::Pump,
                Arc::new(move |_: &Value| {
                    hits.fetch_add(1, Ordering::Relaxed);
                }),
            );
        }

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("known", count), &count, |b, _| {
            b.iter(|| registry.dispatch(black_box("pump"), black_box(&payload)));
        });
    }

    let registry = EventRegistry::new();
    group.throughput(Throughput::Elements(1));
    group.bench_function("unregistered", |b| {
        b.iter(|| registry.dispatch(black_box("circuit"), black_box(&payload)));
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_dispatch);
criterion_main!(benches);
