//! Layout and diff benchmark: measure wrap and row-diff performance.
//!
//! Target: < 100µs to wrap a 4KiB line at 800px

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tailpane::{DiffEngine, LineWrapper, MonospaceMetrics, Rgb, ScrollBuffer, SourceId};

/// Build a line of repeated words for benchmarking.
fn test_line(len: usize) -> String {
    let mut line = String::with_capacity(len + 16);
    let words = ["daemon", "started", "pid", "4711", "config", "reloaded"];
    let mut i = 0;
    while line.len() < len {
        line.push_str(words[i % words.len()]);
        line.push(' ');
        i += 1;
    }
    line
}

fn wrapper(word_wrap: bool, justify: bool) -> LineWrapper<MonospaceMetrics> {
    LineWrapper::new(MonospaceMetrics::new(8), 800, "|| ", word_wrap, justify, 8)
}

fn wrap_hard_break(c: &mut Criterion) {
    let line = test_line(4096);
    let w = wrapper(false, false);

    c.bench_function("wrap_4k_hard_break", |b| {
        b.iter(|| w.wrap(black_box(&line), Rgb::WHITE, SourceId(0), false))
    });
}

fn wrap_word_wrap(c: &mut Criterion) {
    let line = test_line(4096);
    let w = wrapper(true, false);

    c.bench_function("wrap_4k_word_wrap", |b| {
        b.iter(|| w.wrap(black_box(&line), Rgb::WHITE, SourceId(0), false))
    });
}

fn wrap_justified(c: &mut Criterion) {
    let line = test_line(4096);
    let w = wrapper(true, true);

    c.bench_function("wrap_4k_justified", |b| {
        b.iter(|| w.wrap(black_box(&line), Rgb::WHITE, SourceId(0), false))
    });
}

fn wrap_by_line_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrap_by_length");
    let w = wrapper(true, false);

    for len in [80, 512, 4096, 65536] {
        let line = test_line(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &line, |b, line| {
            b.iter(|| w.wrap(black_box(line), Rgb::WHITE, SourceId(0), false))
        });
    }

    group.finish();
}

fn diff_unchanged_buffer(c: &mut Criterion) {
    let w = wrapper(true, false);
    let mut buffer = ScrollBuffer::new(50, false, Rgb::DEFAULT);
    for i in 0..60 {
        let segments = w
            .wrap(&test_line(60 + i), Rgb::WHITE, SourceId(0), false)
            .unwrap();
        buffer.append_segments(segments);
    }
    let mut diff = DiffEngine::new();
    diff.diff(&buffer, false);

    c.bench_function("diff_50_rows_unchanged", |b| {
        b.iter(|| diff.diff(black_box(&buffer), false))
    });
}

fn diff_scrolled_buffer(c: &mut Criterion) {
    let w = wrapper(true, false);
    let mut buffer = ScrollBuffer::new(50, false, Rgb::DEFAULT);
    for i in 0..60 {
        let segments = w
            .wrap(&test_line(60 + i), Rgb::WHITE, SourceId(0), false)
            .unwrap();
        buffer.append_segments(segments);
    }

    c.bench_function("diff_50_rows_scrolled", |b| {
        b.iter_batched(
            || {
                let mut diff = DiffEngine::new();
                diff.diff(&buffer, false);
                let mut scrolled = ScrollBuffer::new(50, false, Rgb::DEFAULT);
                for i in 0..51 {
                    let segments = w
                        .wrap(&test_line(60 + i), Rgb::WHITE, SourceId(0), false)
                        .unwrap();
                    scrolled.append_segments(segments);
                }
                (diff, scrolled)
            },
            |(mut diff, scrolled)| diff.diff(black_box(&scrolled), false),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    wrap_hard_break,
    wrap_word_wrap,
    wrap_justified,
    wrap_by_line_length,
    diff_unchanged_buffer,
    diff_scrolled_buffer,
);
criterion_main!(benches);
