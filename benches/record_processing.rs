//! Benchmarks for the per-event hot path
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use saedump_player::dump::{DumpMetadata, DumpWriter, EventEnvelope, RecordSplitter};
use saedump_player::payload::{FieldPath, TimestampRewriter};
use std::io::Cursor;

#[derive(Clone, PartialEq, prost::Message)]
struct VideoFrame {
    #[prost(string, tag = "1")]
    source_id: String,
    #[prost(uint64, tag = "2")]
    timestamp_utc_ms: u64,
    #[prost(bytes = "vec", tag = "4")]
    frame_data: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct SaeMessage {
    #[prost(message, optional, tag = "1")]
    frame: Option<VideoFrame>,
}

fn payload(frame_bytes: usize) -> Vec<u8> {
    prost::Message::encode_to_vec(&SaeMessage {
        frame: Some(VideoFrame {
            source_id: "videosource:cam1".into(),
            timestamp_utc_ms: 1_700_000_000_000,
            frame_data: vec![0x42; frame_bytes],
        }),
    })
}

fn dump(events: usize, frame_bytes: usize) -> Vec<u8> {
    let meta = DumpMetadata::new(vec!["videosource:cam1".into()], 1_700_000_000.0);
    let mut writer = DumpWriter::new(Vec::new(), &meta).unwrap();
    let payload = payload(frame_bytes);
    for i in 0..events {
        writer
            .write_event(&EventEnvelope {
                index: i as u64,
                source_stream: "videosource:cam1".into(),
                record_time: 1_700_000_000.0 + i as f64 * 0.04,
                payload: payload.clone(),
            })
            .unwrap();
    }
    writer.finish().unwrap()
}

fn bench_split_and_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_and_decode");

    for frame_bytes in [1_024usize, 64 * 1024].iter() {
        let data = dump(100, *frame_bytes);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("events_100", frame_bytes), &data, |b, data| {
            b.iter(|| {
                let mut splitter = RecordSplitter::new(Cursor::new(data.as_slice()));
                let meta = DumpMetadata::decode(&splitter.next().unwrap().unwrap()).unwrap();
                let mut total = 0usize;
                for (i, record) in splitter.enumerate() {
                    let event = EventEnvelope::decode(&record.unwrap(), i as u64).unwrap();
                    total += event.payload.len();
                    black_box(event.offset_from(&meta));
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

fn bench_timestamp_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("timestamp_rewrite");
    let rewriter = TimestampRewriter::new(FieldPath::default());

    for frame_bytes in [0usize, 1_024, 64 * 1024].iter() {
        let payload = payload(*frame_bytes);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::new("rewrite_at", frame_bytes), &payload, |b, payload| {
            b.iter(|| black_box(rewriter.rewrite_at(0, black_box(payload), 1_700_000_123_456).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_split_and_decode, bench_timestamp_rewrite);

criterion_main!(benches);
