//! Tag resolution benchmarks
//!
//! Measures picking the newest release tag from large tag listings, as
//! returned by `git tag --list v*` for long-lived plugins.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tim::version::semver::{max_version, sort_versions};
use tim::version::version_from_spec;

/// Tag listing with a mix of releases, pre-releases and junk
fn tag_listing(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 10 {
            0 => format!("v{}.{}.{}-rc.{}", i / 100, (i / 10) % 10, i % 10, i % 3),
            7 => format!("v{}-nightly", i),
            9 => format!("v{}.{}", i / 100, (i / 10) % 10),
            _ => format!("v{}.{}.{}", i / 100, (i / 10) % 10, i % 10),
        })
        .collect()
}

fn bench_max_version(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_version");
    for count in [10, 100, 1_000, 10_000] {
        let tags = tag_listing(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &tags, |b, tags| {
            b.iter(|| max_version(black_box(tags)))
        });
    }
    group.finish();
}

fn bench_sort_versions(c: &mut Criterion) {
    let tags = tag_listing(1_000);
    c.bench_function("sort_versions_1000", |b| b.iter(|| sort_versions(black_box(&tags))));
}

fn bench_version_from_spec(c: &mut Criterion) {
    let specs = ["v1.2.3", "1.2.3", "main", "feature/new-status-line", "v2"];
    c.bench_function("version_from_spec", |b| {
        b.iter(|| {
            for spec in specs {
                black_box(version_from_spec(black_box(spec)));
            }
        })
    });
}

criterion_group!(benches, bench_max_version, bench_sort_versions, bench_version_from_spec);
criterion_main!(benches);
