//! Benchmarks for quiet-period reassembly
//!
//! Measures per-chunk overhead for:
//! - Single-stream accumulation and flush
//! - Single-sender filtering with an interleaved second sender
//! - Per-source reassembly across many TCP clients
//!
//! Platform: Cross-platform, synthetic data (CI-safe)

use bytescope::{PerSourceReassembler, QuietPeriodReassembler, SourceFilter, SourceId};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::{Duration, Instant};

const CHUNK: [u8; 64] = [0x55; 64];
const CHUNKS_PER_MESSAGE: usize = 64;

fn bench_single_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("quiet_period");
    group.throughput(Throughput::Bytes((CHUNK.len() * CHUNKS_PER_MESSAGE) as u64));

    group.bench_function("accumulate_and_flush", |b| {
        let mut reassembler = QuietPeriodReassembler::default();
        let source = SourceId::Connection(1);
        let now = Instant::now();
        b.iter(|| {
            for _ in 0..CHUNKS_PER_MESSAGE {
                reassembler.on_chunk(source, black_box(&CHUNK), now);
            }
            black_box(reassembler.on_idle_timeout())
        })
    });

    group.bench_function("single_sender_interleaved", |b| {
        let mut reassembler =
            QuietPeriodReassembler::new(QuietPeriodReassembler::DEFAULT_IDLE_PERIOD, SourceFilter::SingleSender);
        let (owner, intruder) = (SourceId::Connection(1), SourceId::Connection(2));
        let now = Instant::now();
        b.iter(|| {
            for n in 0..CHUNKS_PER_MESSAGE {
                let source = if n % 2 == 0 { owner } else { intruder };
                black_box(reassembler.on_chunk(source, &CHUNK, now));
            }
            black_box(reassembler.on_idle_timeout())
        })
    });

    group.finish();
}

fn bench_per_source(c: &mut Criterion) {
    const CLIENTS: u64 = 32;

    let mut group = c.benchmark_group("per_source");
    group.throughput(Throughput::Elements(CLIENTS * 4));

    group.bench_function("32_clients_expire", |b| {
        let idle = Duration::from_millis(200);
        let mut reassembler = PerSourceReassembler::new(idle);
        let start = Instant::now();
        b.iter(|| {
            for round in 0..4 {
                for client in 0..CLIENTS {
                    reassembler.on_chunk(SourceId::Connection(client), &CHUNK, start + Duration::from_millis(round));
                }
            }
            black_box(reassembler.poll_expired(start + idle * 2))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_single_stream, bench_per_source);
criterion_main!(benches);
