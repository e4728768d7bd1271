use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fragql::{Ctx, Fragment, Values, resolve};

/// UPDATE t SET col0 = ?, ... WHERE col0 = ? AND col1 = ? ...
fn build_update(n: usize) -> Vec<Fragment> {
    let values: Values = (0..n).map(|i| (format!("col{i}"), i as i64)).collect();
    let conditions: Vec<_> = (0..n).map(|i| Ctx.eq(format!("col{i}"), i as i64)).collect();
    vec![Ctx.update("t", values), Ctx.and(conditions)]
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve/update_and");

    for n in [1, 5, 10, 50, 100] {
        let fragments = build_update(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &fragments, |b, fragments| {
            b.iter(|| black_box(resolve(fragments)));
        });
    }

    group.finish();
}

fn bench_build_and_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve/build_and_resolve");

    for n in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(resolve(&build_update(n))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_build_and_resolve);
criterion_main!(benches);
