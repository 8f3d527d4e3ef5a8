use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use supersql::{Dialect, Query, SelectItem, Table};

/// SELECT c0, c1, ... FROM t WHERE c0 = $1 AND c1 = $2 ...
fn build_select(table: &Table, n: usize) -> Query {
    let items: Vec<SelectItem> = (0..n).map(|i| table.col(format!("c{i}")).into()).collect();
    let mut q = Query::new(Dialect::Numbered)
        .select(items)
        .and_then(|q| q.from([table]))
        .unwrap();
    for i in 0..n {
        let condition = table.col(format!("c{i}")).eq(i as i64);
        q = (if i == 0 { q.where_(condition) } else { q.and(condition) }).unwrap();
    }
    q
}

fn bench_to_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/to_sql");
    let table = Table::new("t");

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(&table, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_sql()));
        });
    }

    group.finish();
}

fn bench_unsafe(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/to_unsafe_sql");
    let table = Table::new("t");

    for n in [1, 10, 100] {
        let q = build_select(&table, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_unsafe_sql()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/build_and_render");
    let table = Table::new("t").alias("x");

    for n in [1, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(&table, n).to_sql()));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let q = Query::new(Dialect::Numbered)
                    .select_all()
                    .from(["t"])
                    .and_then(|q| q.where_(supersql::Column::new("id")))
                    .unwrap()
                    .in_(values.iter().copied());
                black_box(q.to_sql());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_to_sql,
    bench_unsafe,
    bench_build_and_render,
    bench_in_list
);
criterion_main!(benches);
