//! Benchmarks for the poll delta and step rendering paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use triageflow::core::{ProgressStep, SequencedStep};
use triageflow::render::render_step;
use triageflow::session::{decode_line, StepCursor};
use triageflow::transport::LineDecoder;

fn snapshot_steps(count: usize) -> Vec<ProgressStep> {
    (0..count)
        .map(|i| {
            if i % 3 == 0 {
                ProgressStep::tool_call(
                    format!("Tool Call: step {i}"),
                    "get_jira_feedback",
                    json!({"jql": "project = UX", "max_results": i}),
                )
            } else {
                ProgressStep::message(format!("Step {i}"), "Analyzing feedback")
            }
        })
        .collect()
}

fn cursor_benchmark(c: &mut Criterion) {
    let polls: Vec<Vec<ProgressStep>> = (1..=50).map(snapshot_steps).collect();

    c.bench_function("cursor_advance_50_polls", |b| {
        b.iter(|| {
            let mut cursor = StepCursor::new();
            let mut emitted = 0;
            for steps in polls.iter().cloned() {
                emitted += cursor.advance(black_box(steps)).len();
            }
            emitted
        });
    });
}

fn render_benchmark(c: &mut Criterion) {
    let steps: Vec<SequencedStep> = snapshot_steps(100)
        .into_iter()
        .enumerate()
        .map(|(i, step)| SequencedStep::new(i + 1, step))
        .collect();

    c.bench_function("render_100_steps", |b| {
        b.iter(|| {
            for step in &steps {
                black_box(render_step(black_box(step)));
            }
        });
    });
}

fn stream_decode_benchmark(c: &mut Criterion) {
    let body: String = snapshot_steps(100)
        .iter()
        .map(|step| format!("{}\n", serde_json::to_string(step).unwrap_or_default()))
        .collect();
    let bytes = body.into_bytes();

    c.bench_function("decode_100_lines_in_64b_chunks", |b| {
        b.iter(|| {
            let mut decoder = LineDecoder::new();
            let mut decoded = 0;
            for chunk in bytes.chunks(64) {
                for line in decoder.push(black_box(chunk)).into_iter().flatten() {
                    if let Some(Ok(_)) = decode_line(&line) {
                        decoded += 1;
                    }
                }
            }
            decoded
        });
    });
}

criterion_group!(
    benches,
    cursor_benchmark,
    render_benchmark,
    stream_decode_benchmark
);
criterion_main!(benches);
