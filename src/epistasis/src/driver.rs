use anyhow::{Context, Result};
use itertools::Itertools;
use log::{info, trace};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::classify::{choose_high_risk, RiskRule};
use crate::counts::{combination_counts, GenotypeCells};
use crate::dataset::{CaseControlDataset, Fold, FoldView};
use crate::error::EpistasisError;
use crate::eval::{ConfusionBuilder, Evaluator};
use crate::masks::MaskBuffer;
use crate::ranking::{Ranking, RankingOutcome};
use crate::risky::RiskyCombination;

/// Settings of one epistasis search.
pub struct EpistasisConfig {
    /// Number of SNPs per tuple.
    pub order           : usize,
    /// Cross-validation folds; 1 = resubstitution.
    pub num_folds       : usize,
    /// Hard cap of the final ranking.
    pub max_ranking_size: usize,
    pub evaluator       : Evaluator,
    pub rule            : RiskRule,
    /// Tuples sharing one mask-region refill.
    pub rows_per_batch  : usize,
    /// Worker threads; 0 picks the rayon default.
    pub threads         : usize,
}

impl EpistasisConfig {
    pub fn new(order: usize) -> Self {
        Self {
            order,
            num_folds       : 5,
            max_ranking_size: 10,
            evaluator       : Evaluator::default(),
            rule            : RiskRule::default(),
            rows_per_batch  : 64,
            threads         : 0,
        }
    }
}

/// Cross-validated exhaustive search over order-k SNP tuples.
///
/// For every fold, each tuple's training masks feed the counting kernel
/// and the high-risk rule; the flagged combination is then scored on the
/// fold's validation samples and submitted to the shared ranking. Workers
/// each own a mask region per fold and a scratchpad combination, cloned
/// only when the ranking accepts it.
pub fn run(dataset: &CaseControlDataset, config: &EpistasisConfig) -> Result<Ranking> {
    let err_context = "While configuring the epistasis search";
    if config.order == 0 || config.order > dataset.num_snps() {
        return Err(EpistasisError::InvalidOrder { order: config.order, num_snps: dataset.num_snps() })
            .context(err_context)
    }
    if config.num_folds > 1 && config.num_folds > dataset.num_affected().min(dataset.num_unaffected()) {
        return Err(EpistasisError::TooManyFolds {
            folds     : config.num_folds,
            affected  : dataset.num_affected(),
            unaffected: dataset.num_unaffected(),
        }).context(err_context)
    }

    let folds = Fold::partition(dataset.num_affected(), dataset.num_unaffected(), config.num_folds);
    let views: Vec<(FoldView, FoldView)> = folds.iter()
        .map(|fold| (FoldView::training(dataset, fold), FoldView::validation(dataset, fold)))
        .collect();

    let cells = GenotypeCells::new(config.order);
    let tuples: Vec<Vec<usize>> = (0..dataset.num_snps()).combinations(config.order).collect();
    info!("Evaluating {} order-{} SNP tuples across {} fold(s)", tuples.len(), config.order, folds.len());

    let rows_per_batch = config.rows_per_batch.max(1);
    let ranking = Mutex::new(Ranking::with_capacity(config.max_ranking_size));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .context("Failed to build the epistasis thread pool")?;
    pool.install(|| {
        tuples.par_chunks(rows_per_batch).for_each_init(
            || Worker::new(&views, config, rows_per_batch),
            |worker, batch| worker.process(batch, &views, &cells, config, &ranking),
        );
    });

    let ranking = ranking.into_inner();
    info!("Epistasis ranking holds {} combination(s)", ranking.len());
    Ok(ranking)
}

/// Per-thread working set: one mask region per fold, reusable count
/// vectors, and the scratchpad combination.
struct Worker {
    masks       : Vec<MaskBuffer>,
    counts_aff  : Vec<u32>,
    counts_unaff: Vec<u32>,
    risky_cells : Vec<usize>,
    scratch     : RiskyCombination,
    confusion   : ConfusionBuilder,
}

impl Worker {
    fn new(views: &[(FoldView, FoldView)], config: &EpistasisConfig, rows_per_batch: usize) -> Self {
        let masks = views.iter()
            .map(|(training, _)| MaskBuffer::new(*training.layout(), config.order, rows_per_batch))
            .collect();
        Self {
            masks,
            counts_aff  : Vec::new(),
            counts_unaff: Vec::new(),
            risky_cells : Vec::new(),
            scratch     : RiskyCombination::new(config.order),
            confusion   : ConfusionBuilder::new(),
        }
    }

    fn process(
        &mut self,
        batch  : &[Vec<usize>],
        views  : &[(FoldView, FoldView)],
        cells  : &GenotypeCells,
        config : &EpistasisConfig,
        ranking: &Mutex<Ranking>,
    ) {
        let mut columns: Vec<&[u8]> = Vec::with_capacity(config.order);
        for (fold_idx, (training, validation)) in views.iter().enumerate() {
            let masks = &mut self.masks[fold_idx];
            for (row, tuple) in batch.iter().enumerate() {
                columns.clear();
                columns.extend(tuple.iter().map(|&snp| training.column(snp)));
                masks.fill_row(row, &columns);
            }
            combination_counts(masks, cells, batch.len(), &mut self.counts_aff, &mut self.counts_unaff);

            let cells_per_tuple = cells.len();
            let total_aff   = training.layout().num_affected() as u32;
            let total_unaff = training.layout().num_unaffected() as u32;
            for (row, tuple) in batch.iter().enumerate() {
                let aff   = &self.counts_aff[row * cells_per_tuple..][..cells_per_tuple];
                let unaff = &self.counts_unaff[row * cells_per_tuple..][..cells_per_tuple];
                let aux = choose_high_risk(config.rule, aff, unaff, total_aff, total_unaff, &mut self.risky_cells);
                if self.risky_cells.is_empty() {
                    continue
                }
                self.scratch.assign(tuple, cells, &self.risky_cells, aux);

                let matrix = self.confusion.matrix(&self.scratch, validation);
                debug_assert_eq!(matrix.total_affected() as usize, validation.layout().num_affected());
                debug_assert_eq!(matrix.total_unaffected() as usize, validation.layout().num_unaffected());

                let Some(accuracy) = config.evaluator.score(&matrix) else {
                    continue // Unscorable: stays out of the ranking.
                };
                self.scratch.set_accuracy(accuracy);

                let mut guard = ranking.lock();
                if guard.accepts(accuracy) {
                    if let RankingOutcome::Inserted { position, evicted } = guard.insert(self.scratch.clone()) {
                        trace!("fold {fold_idx}: tuple {tuple:?} ranked at {position} with accuracy {accuracy:.6}");
                        drop(evicted); // Ownership is ours; nothing auxiliary to release for MDR.
                    }
                }
            }
        }
    }
}
