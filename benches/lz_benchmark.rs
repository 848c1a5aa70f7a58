use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use prism_varlena::{compress, decompress, CompressionStrategy, Varlena};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn text_input(len: usize) -> Vec<u8> {
    b"SELECT name, salary FROM employees WHERE dept_id = 42 ORDER BY salary; "
        .iter()
        .cycle()
        .take(len)
        .copied()
        .collect()
}

fn noisy_input(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(17);
    (0..len).map(|_| b"abcdefgh"[rng.random_range(0..8)]).collect()
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("lz_compress");
    for len in [256usize, 4096, 65_536] {
        for (name, raw) in [("text", text_input(len)), ("noisy", noisy_input(len))] {
            group.throughput(Throughput::Bytes(len as u64));
            group.bench_with_input(BenchmarkId::new(name, len), &raw, |b, raw| {
                b.iter(|| compress(black_box(raw), &CompressionStrategy::ALWAYS))
            });
        }
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("lz_decompress");
    for len in [256usize, 4096, 65_536] {
        let raw = text_input(len);
        let Ok(block) = compress(&raw, &CompressionStrategy::ALWAYS) else {
            continue;
        };
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &block, |b, block| {
            b.iter(|| decompress(black_box(block), len as u32))
        });
    }
    group.finish();
}

fn bench_pack(c: &mut Criterion) {
    let raw = text_input(2000);
    c.bench_function("varlena_pack_default", |b| {
        b.iter(|| Varlena::pack(black_box(&raw), &CompressionStrategy::DEFAULT))
    });
}

criterion_group!(benches, bench_compress, bench_decompress, bench_pack);
criterion_main!(benches);
