//! Benchmarks for the structural merge.
//!
//! Two shapes matter in practice:
//! - the repoll steady state: the new snapshot is value-identical and the
//!   merge should collapse to the old pointers
//! - a sparse update: one leaf changed somewhere in a wide tree

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};

use tributary::merge::{SharedValue, structural_merge};

const GROUP_COUNTS: &[usize] = &[16, 128, 1024];

fn issue_list(count: usize) -> Value {
    let groups: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "id": i,
                "culprit": format!("handler_{i}"),
                "tags": {"env": "prod", "release": "1.2.3"},
                "stats": [[i, i * 2], [i + 1, i * 3]],
            })
        })
        .collect();
    json!({"groups": groups, "meta": {"cursor": "abc", "hasMore": true}})
}

fn perturbed(count: usize) -> Value {
    let mut value = issue_list(count);
    value["groups"][count / 2]["culprit"] = json!("changed_handler");
    value
}

fn merge_identical(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_identical");
    for &count in GROUP_COUNTS {
        let old = SharedValue::from_value(issue_list(count));
        let new = SharedValue::from_value(issue_list(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| structural_merge(&old, &new));
        });
    }
    group.finish();
}

fn merge_one_changed(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_one_changed");
    for &count in GROUP_COUNTS {
        let old = SharedValue::from_value(issue_list(count));
        let new = SharedValue::from_value(perturbed(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| structural_merge(&old, &new));
        });
    }
    group.finish();
}

fn rebuild_from_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_value");
    for &count in GROUP_COUNTS {
        let value = issue_list(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| SharedValue::from_value(value.clone()));
        });
    }
    group.finish();
}

criterion_group!(benches, merge_identical, merge_one_changed, rebuild_from_value);
criterion_main!(benches);
