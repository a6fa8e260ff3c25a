use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use facetdex::index::posting::{intersect_sorted, union_sorted};
use facetdex::query::ast::BucketSource;
use facetdex::{Database, DocId, EngineConfig, Query, QueryOptions};
use rand::Rng;
use serde_json::{json, Value};

const MAKES: [&str; 6] = ["volvo", "tesla", "bmw", "audi", "saab", "fiat"];
const COLORS: [&str; 5] = ["red", "blue", "black", "white", "green"];
const WORDS: [&str; 8] = ["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"];

/// Helper to create test documents
fn create_test_document(id: u64, words: usize) -> Value {
    let mut rng = rand::thread_rng();
    let description: String = (0..words)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ");

    json!({
        "_id": id,
        "make": MAKES[rng.gen_range(0..MAKES.len())],
        "color": COLORS[rng.gen_range(0..COLORS.len())],
        "year": rng.gen_range(2000..2025),
        "description": description,
    })
}

fn corpus(docs: u64) -> Database {
    let db = Database::open(EngineConfig {
        cache_capacity: 0,
        ..EngineConfig::default()
    })
    .unwrap();
    db.put((0..docs).map(|id| create_test_document(id, 20)).collect())
        .unwrap();
    db
}

/// Benchmark batch ingestion
fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    for batch_size in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let db = Database::in_memory().unwrap();
                let mut next_id = 0u64;
                b.iter(|| {
                    let docs = (0..batch_size)
                        .map(|_| {
                            next_id += 1;
                            create_test_document(next_id, 20)
                        })
                        .collect();
                    db.put(docs).unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark query evaluation per operator
fn bench_queries(c: &mut Criterion) {
    let db = corpus(10_000);
    let options = QueryOptions::default();
    let mut group = c.benchmark_group("query");

    let queries = [
        ("get", Query::get("make", "volvo")),
        ("and", Query::and(vec![Query::literal("make", "volvo"), Query::literal("color", "red")])),
        (
            "or_wide",
            Query::or(MAKES.iter().map(|make| Query::literal("make", *make)).collect()),
        ),
        ("not", Query::not(Query::literal("make", "tesla"), Query::literal("color", "black"))),
        (
            "bucketfilter_distinct",
            Query::bucket_filter(
                BucketSource::Query(Box::new(Query::distinct("make"))),
                Query::literal("color", "blue"),
            ),
        ),
        ("dictionary", Query::dictionary(["make", "color"])),
        ("search_one_term", Query::search(["fox"])),
        ("search_two_terms", Query::search(["quick", "dog"])),
    ];

    for (name, query) in queries.iter() {
        group.bench_function(*name, |b| {
            b.iter(|| db.evaluate(black_box(query), &options).unwrap());
        });
    }
    group.finish();
}

/// Benchmark hydration cost on top of a match query
fn bench_hydration(c: &mut Criterion) {
    let db = corpus(10_000);
    let query = Query::literal("make", "volvo");
    let mut group = c.benchmark_group("hydration");

    group.bench_function("ids_only", |b| {
        b.iter(|| db.evaluate(&query, &QueryOptions::default()).unwrap());
    });
    group.bench_function("with_documents", |b| {
        b.iter(|| db.evaluate(&query, &QueryOptions::with_documents()).unwrap());
    });
    group.finish();
}

/// Benchmark the sorted set primitives
fn bench_set_operations(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let mut group = c.benchmark_group("set_operations");

    for size in [1_000u64, 100_000].iter() {
        let mut a: Vec<DocId> = (0..*size).filter(|_| rng.gen_bool(0.5)).map(DocId::from).collect();
        let mut b: Vec<DocId> = (0..*size).filter(|_| rng.gen_bool(0.05)).map(DocId::from).collect();
        a.sort();
        b.sort();

        group.bench_with_input(BenchmarkId::new("intersect", size), &(&a, &b), |bench, (a, b)| {
            bench.iter(|| intersect_sorted(black_box(a), black_box(b)));
        });
        group.bench_with_input(BenchmarkId::new("union", size), &(&a, &b), |bench, (a, b)| {
            bench.iter(|| union_sorted(black_box(a), black_box(b)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_put, bench_queries, bench_hydration, bench_set_operations);
criterion_main!(benches);
