use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use program_report::*;
use serde_json::{json, Value};

const CATEGORIES: [&str; 5] = ["평생교육강좌", "독서문화행사", "전시", "체험", "기타"];

fn generate_records(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": format!("p{}", i),
                "userId": format!("u{}", i % 7),
                "updatedAt": "2025-03-01T01:00:00Z",
                "overview": {
                    "category": CATEGORIES[i % CATEGORIES.len()],
                    "title": format!("프로그램 {}", count - i),
                    "place": format!("실 {}", i % 13),
                    "startDate": format!("{}-03-{:02}", 2024 + (i % 2), 1 + i % 28),
                    "count": (i % 10) as i64
                },
                "budgetItems": [
                    {"v5": "210-01", "amount": (i * 1000) as i64},
                    {"v5": "310-06", "amount": "12,000"}
                ],
                "performances": [
                    {"opDate": "2025-03-02", "adultM": i % 5, "adultF": i % 7, "childM": 1},
                    {"opDate": "2025-03-09", "teenF": i % 3}
                ]
            })
        })
        .collect()
}

fn users() -> UserDirectory {
    (0..7).map(|i| (format!("u{}", i), format!("담당자{}", i))).collect()
}

fn rows(count: usize) -> Vec<DerivedRow> {
    aggregate_values(&generate_records(count), &users(), &AggregationConfig::default())
        .expect("generated records are well formed")
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let directory = users();
    let config = AggregationConfig::default();

    for size in [100, 1000, 5000].iter() {
        let records = RawRecord::parse_all(&generate_records(*size)).expect("well formed");
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| aggregate(black_box(&records), &directory, &config));
        });
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    let layout = ReportLayout::status();

    for size in [100, 1000, 5000].iter() {
        let rows = rows(*size);
        let filters = ColumnFilters::initialize(&rows, &layout.filter_columns())
            .toggle_value(&rows, "category", "전시", false)
            .set_search("title", "1");
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| filters.apply(black_box(&rows)));
        });
    }
    group.finish();
}

fn bench_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("order");
    let layout = ReportLayout::status();
    let ranks = RankTable::from_labels(CATEGORIES);

    for size in [100, 1000, 5000].iter() {
        let rows = rows(*size);
        group.bench_with_input(BenchmarkId::new("default", size), size, |b, _| {
            b.iter(|| Orderer::new(&layout).order(black_box(rows.clone()), &SortState::none(), &ranks, None));
        });
        group.bench_with_input(BenchmarkId::new("by_title_desc", size), size, |b, _| {
            b.iter(|| {
                Orderer::new(&layout).order(black_box(rows.clone()), &SortState::desc("title"), &ranks, Some("2025"))
            });
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let layout = ReportLayout::status();
    let ranks = RankTable::from_labels(CATEGORIES);

    for size in [100, 1000, 5000].iter() {
        let rows = rows(*size);
        let filters = ColumnFilters::initialize(&rows, &layout.filter_columns());
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                Pipeline::new(&layout).run(black_box(&rows), &filters, &SortState::asc("category"), &ranks, None)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_aggregate,
    bench_filter,
    bench_order,
    bench_pipeline
);
criterion_main!(benches);
