//! Validator performance benchmarks.
//!
//! Measures the format classifier on its own and the full row loop over
//! in-memory bodies of increasing size.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use csvlint::{FormatClassifier, MockTransport, Source, Validator};

/// One value per format category, plus a few near misses.
const FORMAT_SAMPLES: &[&str] = &[
    "42",
    "-3.14",
    "1,234,567",
    "http://example.com/data.csv",
    "2023-06-01",
    "1 Jun 2023",
    "June 1, 2023",
    "12:30",
    "12:30:45",
    "2023-06-01 12:30:45",
    "2023-06-01T12:30:45Z",
    "June 01, 2023 12:30",
    "2023-02-30",
    "Smarch 1, 2023",
    "plain text",
    "",
];

/// Generate a CSV body with a header and mixed column formats.
fn generate_csv_data(rows: usize, cols: usize) -> String {
    let mut data = String::new();

    let header: Vec<String> = (0..cols).map(|c| format!("col_{}", c)).collect();
    data.push_str(&header.join(","));
    data.push_str("\r\n");

    for row in 0..rows {
        for col in 0..cols {
            if col > 0 {
                data.push(',');
            }
            match col % 5 {
                0 => data.push_str(&format!("ID_{:06}", row)),
                1 => data.push_str(&format!("{:.2}", row as f64 * 1.5)),
                2 => data.push_str(&format!("2023-{:02}-{:02}", (row % 12) + 1, (row % 28) + 1)),
                3 => data.push_str(&format!("\"Name, {}\"", row)),
                4 => data.push_str(&format!("http://example.com/{}", row % 10)),
                _ => unreachable!(),
            }
        }
        data.push_str("\r\n");
    }

    data
}

fn bench_classify(c: &mut Criterion) {
    let classifier = FormatClassifier::new();
    let mut group = c.benchmark_group("classify");

    group.bench_function("samples", |b| {
        b.iter(|| {
            for value in FORMAT_SAMPLES {
                black_box(classifier.classify(black_box(value)));
            }
        })
    });

    group.bench_function("numeric", |b| {
        b.iter(|| black_box(classifier.classify(black_box("1,234,567.89"))))
    });

    group.bench_function("string_fallthrough", |b| {
        b.iter(|| black_box(classifier.classify(black_box("not a date or a number"))))
    });

    group.finish();
}

/// Benchmark the whole validation pass for bodies of various sizes.
fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_csv_data(*rows, 10);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| {
                let mut validator = Validator::with_transport(MockTransport::new());
                black_box(validator.validate(&Source::stream(data.as_str())))
            })
        });
    }

    group.finish();
}

/// Benchmark how validation scales with row width.
fn bench_validate_column_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_columns");

    for cols in [5, 20, 50].iter() {
        let data = generate_csv_data(1_000, *cols);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("cols", cols), &data, |b, data| {
            b.iter(|| {
                let mut validator = Validator::with_transport(MockTransport::new());
                black_box(validator.validate(&Source::stream(data.as_str())))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_classify,
    bench_validate,
    bench_validate_column_scaling,
);
criterion_main!(benches);
