//! Parse and aggregation benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use load_inspector::summary::required_keys;
use load_inspector::{AggregateCounters, StatRecord};

fn stats_fixture() -> String {
    required_keys()
        .into_iter()
        .enumerate()
        .map(|(i, key)| format!("{key} {}\n", i * 1_000))
        .collect()
}

fn benchmark_summary(c: &mut Criterion) {
    let text = stats_fixture();
    let record: StatRecord = text.parse().expect("fixture parses");

    c.bench_function("parse_stats", |b| {
        b.iter(|| black_box(text.parse::<StatRecord>()).is_ok());
    });

    c.bench_function("aggregate_counters", |b| {
        b.iter(|| black_box(AggregateCounters::from_record(black_box(&record))).is_ok());
    });

    c.bench_function("build_charts", |b| {
        let counters = AggregateCounters::from_record(&record).expect("all keys present");
        b.iter(|| black_box(counters.charts()));
    });
}

criterion_group!(benches, benchmark_summary);
criterion_main!(benches);
