use chrono::Utc;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use queries::cursor::{self, Position};
use queries::{CursorPage, PageLimits};

fn bench_encode(c: &mut Criterion) {
    let position = Position::new(Utc::now(), 1_234_567);

    c.bench_function("cursor/encode", |b| {
        b.iter(|| cursor::encode(black_box(&position)))
    });
}

fn bench_decode(c: &mut Criterion) {
    let token = cursor::encode(&Position::new(Utc::now(), 1_234_567));

    c.bench_function("cursor/decode", |b| {
        b.iter(|| cursor::decode(black_box(&token)).unwrap())
    });
}

fn bench_page_assembly(c: &mut Criterion) {
    let limits = PageLimits::default();
    let now = Utc::now();

    c.bench_function("cursor/page_of_100_with_overfetch", |b| {
        b.iter(|| {
            let limit = limits.resolve(Some(100));
            let rows: Vec<i64> = (0..=i64::from(limit)).rev().collect();
            CursorPage::from_overfetch(black_box(rows), limit, |id| Position::new(now, *id))
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_page_assembly);
criterion_main!(benches);
