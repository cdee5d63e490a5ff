use criterion::{black_box, criterion_group, criterion_main, Criterion};

use epistasis::{combination_counts, CaseControlDataset, FoldView, GenotypeCells, MaskBuffer, SnpId};

/// Drive the AND + popcount kernel over a realistic mask region:
/// 64 order-2 tuples, 800 affected / 800 unaffected samples.
fn bench_combination_counts(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(42);
    let (num_snps, affected, unaffected) = (96, 800usize, 800usize);

    let genotypes: Vec<u8> = (0..num_snps * (affected + unaffected)).map(|_| rng.u8(..3)).collect();
    let snps: Vec<SnpId> = (0..num_snps as u64)
        .map(|position| SnpId {
            chromosome: "1".to_string(),
            position,
            reference : "A".to_string(),
            alternate : "C".to_string(),
        })
        .collect();
    let dataset = CaseControlDataset::from_codes(snps, genotypes, affected, unaffected);

    let affected_samples  : Vec<usize> = (0..affected).collect();
    let unaffected_samples: Vec<usize> = (affected..affected + unaffected).collect();
    let view = FoldView::build(&dataset, &affected_samples, &unaffected_samples);

    let (order, rows) = (2usize, 64usize);
    let mut masks = MaskBuffer::new(*view.layout(), order, rows);
    for row in 0..rows {
        masks.fill_row(row, &[view.column(row), view.column(row + 1)]);
    }
    let cells = GenotypeCells::new(order);

    let (mut counts_aff, mut counts_unaff) = (Vec::new(), Vec::new());
    c.bench_function("combination_counts_64_tuples_1600_samples", |b| {
        b.iter(|| {
            combination_counts(black_box(&masks), &cells, rows, &mut counts_aff, &mut counts_unaff);
            black_box(counts_aff.last().copied())
        })
    });
}

criterion_group!(benches, bench_combination_counts);
criterion_main!(benches);
