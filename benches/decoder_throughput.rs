//! Benchmarks for the video frame decoder
//!
//! Measures scan throughput for:
//! - A clean stream of VGA frames in datagram-sized chunks
//! - The same stream with lost datagrams, forcing truncation recovery
//! - Legacy profile frames
//! - Long runs of headerless noise before a frame
//!
//! Platform: Cross-platform, synthetic data (CI-safe)

use bytes::Bytes;
use bytescope::{FrameLayout, FrameProfile, StatusCode, VideoFrameDecoder};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

const DATAGRAM: usize = 1400;

/// Encode `count` frames back to back, cycling through two status codes
fn encoded_stream(profile: FrameProfile, width: u16, height: u16, count: usize) -> Vec<u8> {
    let pixels: Vec<u8> = (0..width as usize * height as usize * 2).map(|i| (i & 0x7F) as u8).collect();
    let mut stream = Vec::new();
    for n in 0..count {
        let status = if n % 2 == 0 { StatusCode::NOMINAL } else { StatusCode::FAULT };
        let frame: Bytes = profile.encode(width, height, status, &pixels).expect("valid frame");
        stream.extend_from_slice(&frame);
    }
    stream
}

fn decode_all(layout: FrameLayout, datagrams: &[&[u8]]) -> u64 {
    let mut decoder = VideoFrameDecoder::new(layout);
    for datagram in datagrams {
        black_box(decoder.on_chunk(datagram));
    }
    decoder.stats().frames
}

fn bench_clean_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder_clean_stream");

    for (width, height) in [(160u16, 120u16), (320, 240), (640, 480)] {
        let stream = encoded_stream(FrameProfile::Current, width, height, 8);
        let datagrams: Vec<&[u8]> = stream.chunks(DATAGRAM).collect();

        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &datagrams,
            |b, datagrams| b.iter(|| decode_all(FrameLayout::default(), datagrams)),
        );
    }

    group.finish();
}

fn bench_lossy_stream(c: &mut Criterion) {
    let stream = encoded_stream(FrameProfile::Current, 320, 240, 16);
    // Drop every 50th datagram
    let datagrams: Vec<&[u8]> =
        stream.chunks(DATAGRAM).enumerate().filter(|(i, _)| i % 50 != 49).map(|(_, d)| d).collect();

    let mut group = c.benchmark_group("decoder_lossy_stream");
    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("320x240_2pct_loss", |b| b.iter(|| decode_all(FrameLayout::default(), &datagrams)));
    group.finish();
}

fn bench_legacy_profile(c: &mut Criterion) {
    let stream = encoded_stream(FrameProfile::Legacy, 640, 480, 4);
    let datagrams: Vec<&[u8]> = stream.chunks(DATAGRAM).collect();
    let layout = FrameLayout::new(FrameProfile::Legacy, 4096);

    let mut group = c.benchmark_group("decoder_legacy_profile");
    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("640x480", |b| b.iter(|| decode_all(layout, &datagrams)));
    group.finish();
}

fn bench_noise_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder_noise_stream");

    // Noise stays below the buffer cap, so every datagram extends one long search
    for noise_len in [64 * 1024usize, 256 * 1024] {
        let mut stream = vec![0u8; noise_len];
        stream.extend_from_slice(&encoded_stream(FrameProfile::Current, 160, 120, 1));
        let datagrams: Vec<&[u8]> = stream.chunks(DATAGRAM).collect();

        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(noise_len), &datagrams, |b, datagrams| {
            b.iter(|| decode_all(FrameLayout::default(), datagrams))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_clean_stream, bench_lossy_stream, bench_legacy_profile, bench_noise_stream);
criterion_main!(benches);
