//! Benchmarks for preload planning, key filters and SQL rendering.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use sinew_query::query::{JoinClause, SelectQuery};
use sinew_query::{Filter, FilterValue, KeySet, OrderByField, Preload, PreloadPlan, RecordKey};

// ============================================================================
// Helper Functions
// ============================================================================

fn nested_paths(depth: usize) -> Vec<Preload> {
    (1..=depth)
        .map(|n| {
            let path: Vec<String> = (1..=n).map(|level| format!("level{}s", level)).collect();
            Preload::new(path.join("."))
        })
        .collect()
}

fn key_set(size: i64, composite: bool) -> KeySet {
    (1..=size)
        .filter_map(|id| {
            let mut values = vec![Some(FilterValue::Int(id))];
            if composite {
                values.push(Some(FilterValue::String(format!("locale{}", id % 3))));
            }
            RecordKey::from_values(values)
        })
        .collect()
}

// ============================================================================
// Plan Benchmarks
// ============================================================================

fn bench_plan_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_build");

    for depth in [1, 3, 10] {
        let preloads = nested_paths(depth);
        group.bench_with_input(BenchmarkId::new("nested", depth), &preloads, |b, preloads| {
            b.iter(|| black_box(PreloadPlan::build(preloads.iter().cloned())))
        });
    }

    let siblings: Vec<Preload> = ["emails", "pets", "pets.toy", "languages", "company", "account"]
        .into_iter()
        .map(Preload::from)
        .collect();
    group.bench_function("siblings", |b| {
        b.iter(|| black_box(PreloadPlan::build(siblings.iter().cloned())))
    });

    group.finish();
}

// ============================================================================
// Key Filter Benchmarks
// ============================================================================

fn bench_key_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_filter");

    for size in [10_i64, 100, 1000] {
        group.throughput(Throughput::Elements(size as u64));

        let single = key_set(size, false);
        group.bench_with_input(BenchmarkId::new("single", size), &single, |b, keys| {
            b.iter(|| black_box(Filter::in_keys(vec!["user_id".into()], keys.to_tuples())))
        });

        let composite = key_set(size, true);
        group.bench_with_input(BenchmarkId::new("composite", size), &composite, |b, keys| {
            b.iter(|| {
                black_box(Filter::in_keys(
                    vec!["document_id".into(), "document_locale".into()],
                    keys.to_tuples(),
                ))
            })
        });
    }

    group.finish();
}

// ============================================================================
// SQL Rendering Benchmarks
// ============================================================================

fn bench_to_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_sql");
    let keys = key_set(100, false);

    let has_many = SelectQuery::new("emails", vec!["id".into(), "user_id".into(), "email".into()])
        .filter(Filter::in_keys(vec!["user_id".into()], keys.to_tuples()))
        .order_by(OrderByField::asc("id").into());
    group.bench_function("has_many", |b| b.iter(|| black_box(has_many.to_sql())));

    let many_to_many = SelectQuery::new("languages", vec!["code".into(), "name".into()])
        .join(JoinClause {
            table: "user_speaks".into(),
            on: vec![("code".into(), "language_code".into())],
            columns: vec!["user_id".into()],
        })
        .filter(Filter::in_keys(
            vec!["user_speaks.user_id".into()],
            keys.to_tuples(),
        ))
        .filter(Filter::equals("name", "English"));
    group.bench_function("many_to_many", |b| b.iter(|| black_box(many_to_many.to_sql())));

    group.finish();
}

criterion_group!(benches, bench_plan_build, bench_key_filter, bench_to_sql);

criterion_main!(benches);
