//! Performance benchmarks for MetaGenomeSync
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use metagenome_sync::core::{
    Chromosome, ChromosomeList, IntervalList, IntervalListBuilder, OperationContext,
    OperationPool, StopToken, Synchronizer, Variant, VariantStore,
};
use metagenome_sync::ops::{fit, query};

const CHROM_LEN: u32 = 50_000_000;

/// Deterministic variant set: every genome inserts or deletes every `step` bases
fn synthetic_store(chromosomes: &ChromosomeList, genomes: &[&str], step: i64) -> VariantStore {
    let mut store = VariantStore::new();
    for chrom in chromosomes.iter() {
        for (g, genome) in genomes.iter().enumerate() {
            let mut position = step + g as i64 * 7;
            let mut n = 0i32;
            while position < chrom.len_i64() {
                let variant = if n % 3 == 0 {
                    Variant::deletion(position, 1 + n % 5, *genome)
                } else {
                    Variant::insertion(position, 1 + n % 11, *genome)
                };
                store.push(chrom.name(), variant);
                position += step;
                n += 1;
            }
        }
    }
    store
}

fn synthetic_list(count: i64, spacing: i64) -> IntervalList {
    let mut builder = IntervalListBuilder::with_capacity(count as usize);
    for i in 0..count {
        let start = i * spacing;
        builder.push(start, start + spacing / 2, (i % 17) as f32).unwrap();
    }
    builder.build()
}

/// Benchmark synchronizing one chromosome
fn bench_synchronize_chromosome(c: &mut Criterion) {
    let genomes = ["A", "B", "C", "D"];
    let chrom = Chromosome::new("chr1", CHROM_LEN);
    let chromosomes = ChromosomeList::new(vec![chrom.clone()]);
    let store = synthetic_store(&chromosomes, &genomes, 1_000);
    let sync = Synchronizer::new(genomes);

    let mut group = c.benchmark_group("synchronize");
    group.throughput(Throughput::Elements(store.len() as u64));
    group.bench_function("chromosome_4_genomes", |b| {
        b.iter(|| {
            let result = sync
                .synchronize_chromosome(black_box(&chrom), &store, &StopToken::new())
                .unwrap();
            black_box(result)
        })
    });
    group.finish();
}

/// Benchmark chromosome-parallel synchronization at different pool sizes
fn bench_synchronize_parallel(c: &mut Criterion) {
    let genomes = ["A", "B", "C", "D"];
    let chromosomes = ChromosomeList::new(
        (1..=8).map(|i| Chromosome::new(format!("chr{}", i), CHROM_LEN / 4)),
    );
    let store = synthetic_store(&chromosomes, &genomes, 2_000);
    let sync = Synchronizer::new(genomes);

    let mut group = c.benchmark_group("synchronize_parallel");
    for workers in [1usize, 2, 4, 8] {
        let pool = OperationPool::with_workers(workers).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(workers), &pool, |b, pool| {
            b.iter(|| {
                let result = sync
                    .synchronize(&chromosomes, &store, pool, &OperationContext::new())
                    .unwrap();
                black_box(result)
            })
        });
    }
    group.finish();
}

/// Benchmark coordinate translation
fn bench_translation(c: &mut Criterion) {
    let genomes = ["A", "B"];
    let chrom = Chromosome::new("chr1", CHROM_LEN);
    let chromosomes = ChromosomeList::new(vec![chrom.clone()]);
    let store = synthetic_store(&chromosomes, &genomes, 500);
    let result = Synchronizer::new(genomes)
        .synchronize_chromosome(&chrom, &store, &StopToken::new())
        .unwrap();
    let table = result.table("B").unwrap();

    c.bench_function("to_meta", |b| {
        b.iter(|| black_box(table.to_meta(black_box(25_000_123)).unwrap()))
    });
    c.bench_function("to_reference", |b| {
        b.iter(|| black_box(table.to_reference(black_box(25_000_123)).unwrap()))
    });
    c.bench_function("meta_to_genome", |b| {
        b.iter(|| black_box(table.meta_to_genome(black_box(25_000_123)).unwrap()))
    });

    let mut group = c.benchmark_group("to_meta_batch");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("10k_positions", |b| {
        b.iter(|| {
            let mut total = 0i64;
            for i in 0..10_000i64 {
                total += table.to_meta(i * 4_999).unwrap();
            }
            black_box(total)
        })
    });
    group.finish();
}

/// Benchmark display fitting at different resolutions
fn bench_fit(c: &mut Criterion) {
    let list = synthetic_list(200_000, 250);

    let mut group = c.benchmark_group("fit");
    group.throughput(Throughput::Elements(list.len() as u64));
    for ppb in [0.0001f64, 0.001, 0.01] {
        group.bench_with_input(BenchmarkId::from_parameter(ppb), &ppb, |b, &ppb| {
            b.iter(|| black_box(fit(&list, ppb).unwrap()))
        });
    }
    group.finish();
}

/// Benchmark window queries
fn bench_query(c: &mut Criterion) {
    let list = synthetic_list(200_000, 250);

    c.bench_function("query_window_10kb", |b| {
        b.iter(|| black_box(query(&list, black_box(25_000_000), black_box(25_010_000))))
    });
}

criterion_group!(
    benches,
    bench_synchronize_chromosome,
    bench_synchronize_parallel,
    bench_translation,
    bench_fit,
    bench_query,
);

criterion_main!(benches);
