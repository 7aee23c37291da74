use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mf_energy::{default_params, RnaSequence};
use mf_partition::{base_pair_probabilities, partition_fast, partition_reference, FoldMode};

const SEQ60: &str = "GGGCUAUUAGCUCAGUUGGUUAGAGCGCACCCCUGAUAAGGGUGAGGUCGCUGAUUCGAA";

fn bench_partition(c: &mut Criterion) {
    let rna = RnaSequence::new("bench", SEQ60).unwrap();
    let params = default_params();

    c.bench_function("partition_reference_60nt", |b| {
        b.iter(|| partition_reference(black_box(&rna), params))
    });
    c.bench_function("partition_fast_60nt", |b| {
        b.iter(|| partition_fast(black_box(&rna), params))
    });
    c.bench_function("posterior_60nt", |b| {
        b.iter(|| base_pair_probabilities(black_box(&rna), params, FoldMode::NoPkFast))
    });
}

criterion_group!(benches, bench_partition);
criterion_main!(benches);
