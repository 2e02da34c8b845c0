use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rail_core::cluster::{ClustererConfig, RailClusterer};
use rail_core::pipeline::{Pipeline, PipelineConfig};
use rail_core::types::{FrameBatch, ObjectDetection, RawSegment};

/// `n` short fragments split evenly between two converging rails, with a
/// horizontal sleeper edge every fourth segment.
fn make_batch(n: usize, frame_index: u64) -> FrameBatch {
    let segments = (0..n)
        .map(|i| {
            let y = 400 + (i as i32 * 7) % 180;
            match i % 4 {
                0 => RawSegment::new(300, y, 700, y),
                1 | 2 => RawSegment::new(500 - y, y, 500 - (y + 40), y + 40),
                _ => RawSegment::new(300 + y, y, 300 + y + 40, y + 40),
            }
        })
        .collect();
    FrameBatch {
        frame_index,
        frame_height: 600,
        segments,
        objects: vec![ObjectDetection {
            class_id: 0,
            label: "person".into(),
            confidence: 0.9,
            bbox: [380.0, 300.0, 420.0, 350.0],
        }],
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for n in [8, 64, 512] {
        group.bench_function(format!("{n}_segments"), |b| {
            let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
            let batch = make_batch(n, 0);
            b.iter(|| black_box(pipeline.process_frame(black_box(&batch))));
        });
    }

    group.finish();
}

fn bench_cluster_restarts(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster");
    let batch = make_batch(128, 0);

    for n_init in [1, 10, 32] {
        let clusterer = RailClusterer::new(ClustererConfig {
            n_init,
            ..Default::default()
        })
        .unwrap();
        group.bench_function(format!("{n_init}_restarts"), |b| {
            b.iter(|| black_box(clusterer.cluster(black_box(&batch.segments))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_cluster_restarts);
criterion_main!(benches);
