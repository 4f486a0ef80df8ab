use criterion::{black_box, criterion_group, criterion_main, Criterion};
use force_buffer::ReadingBuffer;

fn bench_insert(c: &mut Criterion) {
    let buffer = ReadingBuffer::with_default_capacity();
    let mut value = 0.0;
    c.bench_function("insert_full_buffer", |b| {
        b.iter(|| {
            value += 0.5;
            buffer.insert(black_box(value))
        })
    });
}

fn bench_windows(c: &mut Criterion) {
    let buffer = ReadingBuffer::new(1000);
    for i in 0..1000 {
        buffer.insert(i as f64);
    }

    c.bench_function("snapshot_1000", |b| b.iter(|| black_box(buffer.snapshot())));
    c.bench_function("newest_100", |b| b.iter(|| black_box(buffer.newest(100))));
}

criterion_group!(benches, bench_insert, bench_windows);
criterion_main!(benches);
