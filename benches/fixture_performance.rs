use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nucklee::fixture::FixtureParser;
use nucklee::{Dispatcher, MissPolicy, RequestKey, ResponseCache};
use std::sync::Arc;

fn fixture_document(records: usize) -> String {
    (0..records)
        .map(|i| {
            format!(
                "GET /items/{i} HTTP/1.1\nHTTP/1.1 200 OK\n\nContent-Type: application/json\nX-Item: {i}\n\n{{\"id\": {i}, \"name\": \"item {i}\"}}"
            )
        })
        .collect::<Vec<_>>()
        .join("\n##\n")
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixture_parse");
    let parser = FixtureParser::default();

    for records in [1, 10, 100, 1000] {
        let text = fixture_document(records);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("records", records), &text, |b, text| {
            b.iter(|| parser.parse(black_box(text)).filter(Result::is_ok).count())
        });
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let text = fixture_document(1000);
    let mut cache = ResponseCache::new();
    for (key, record) in FixtureParser::default().parse(&text).flatten() {
        cache.insert(key, record);
    }
    let dispatcher = Dispatcher::new(Arc::new(cache), MissPolicy::EmptyOk);
    let hit = RequestKey::new("GET", "/items/500");
    let miss = RequestKey::new("GET", "/items/5000");

    c.bench_function("dispatch_hit", |b| {
        b.iter(|| dispatcher.dispatch(black_box(&hit)).matched)
    });
    c.bench_function("dispatch_miss", |b| {
        b.iter(|| dispatcher.dispatch(black_box(&miss)).matched)
    });
}

criterion_group!(benches, bench_parse, bench_dispatch);
criterion_main!(benches);
