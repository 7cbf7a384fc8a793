//! Benchmarks for the import pipeline: parsing, window computation and both emit modes
//! on a synthetic structure that grows one strut per frame.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tensegrity_import_core::{
    compute_windows, emit, import_json, parse_animation_json, EmitMode, ImportConfig,
};

fn matrix_at(x: f64, y: f64, z: f64) -> String {
    format!("[1,0,0,0, 0,1,0,0, 0,0,1,0, {x},{y},{z},1]")
}

/// `frame_count` frames; frame k lists k joints and k-1 pushes, all slowly drifting in z.
fn growing_structure(frame_count: usize) -> String {
    let frames: Vec<String> = (1..=frame_count)
        .map(|k| {
            let z = k as f64 * 0.01;
            let joints: Vec<String> = (0..k)
                .map(|i| format!(r#"{{"name":"J{i}","matrix":{}}}"#, matrix_at(i as f64, 0.0, z)))
                .collect();
            let pushes: Vec<String> = (1..k)
                .map(|i| {
                    format!(
                        r#"{{"name":"P{i}","matrix":{},"holder":{{"matrix":{}}}}}"#,
                        matrix_at(i as f64 - 0.5, 0.0, z),
                        matrix_at(i as f64 - 0.5, 0.0, z + 0.4)
                    )
                })
                .collect();
            format!(
                r#"{{"joints":[{}],"intervals":{{"push":[{}]}},"camera":{{"position":[0,-10,2],"target":[{},0,0]}}}}"#,
                joints.join(","),
                pushes.join(","),
                k as f64 / 2.0
            )
        })
        .collect();
    format!(r#"{{"fps":60,"frames":[{}]}}"#, frames.join(","))
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for frames in [10, 50, 100] {
        let json = growing_structure(frames);
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &json, |b, json| {
            b.iter(|| parse_animation_json(black_box(json)))
        });
    }
    group.finish();
}

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    for frames in [10, 50, 100] {
        let animation = parse_animation_json(&growing_structure(frames)).unwrap();
        let windows = compute_windows(&animation.frames);
        group.throughput(Throughput::Elements(frames as u64));
        group.bench_with_input(BenchmarkId::new("plain", frames), &animation, |b, anim| {
            b.iter(|| emit(black_box(&anim.frames), None, EmitMode::Plain))
        });
        group.bench_with_input(
            BenchmarkId::new("construction", frames),
            &animation,
            |b, anim| {
                b.iter(|| {
                    emit(
                        black_box(&anim.frames),
                        Some(&windows),
                        EmitMode::Construction,
                    )
                })
            },
        );
        group.bench_with_input(BenchmarkId::new("windows", frames), &animation, |b, anim| {
            b.iter(|| compute_windows(black_box(&anim.frames)))
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let json = growing_structure(60);
    let config = ImportConfig::construction();
    c.bench_function("import_json/construction_60", |b| {
        b.iter(|| import_json(black_box(&json), &config))
    });
}

criterion_group!(benches, bench_parse, bench_emit, bench_end_to_end);
criterion_main!(benches);
