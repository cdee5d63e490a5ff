use crate::counts::and_popcount;
use crate::dataset::FoldView;
use crate::risky::RiskyCombination;

/// Outcome of predicting "affected" for every sample carrying one of a
/// combination's high-risk cells.
///
/// Columns always sum back to the group totals:
/// `true_pos + false_neg == total affected`,
/// `false_pos + true_neg == total unaffected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_pos : u32,
    pub false_neg: u32,
    pub false_pos: u32,
    pub true_neg : u32,
}

impl ConfusionMatrix {
    pub fn total_affected(&self) -> u32 {
        self.true_pos + self.false_neg
    }

    pub fn total_unaffected(&self) -> u32 {
        self.false_pos + self.true_neg
    }

    pub fn total(&self) -> u32 {
        self.total_affected() + self.total_unaffected()
    }
}

/// Scratch space for building per-sample prediction masks. One per worker;
/// the backing buffer is recycled across combinations.
#[derive(Default)]
pub struct ConfusionBuilder {
    mask: Vec<u8>,
}

impl ConfusionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score a risky combination against a fold: a sample is predicted
    /// positive when its genotypes match any flagged cell. Padding cells
    /// carry a non-genotype code, so they never predict positive.
    pub fn matrix(&mut self, combination: &RiskyCombination, view: &FoldView) -> ConfusionMatrix {
        let layout  = view.layout();
        let samples = layout.samples_per_mask();
        self.mask.clear();
        self.mask.resize(samples, 0x00);

        // OR the per-cell match masks together.
        for cell in combination.cells() {
            for sample in 0..samples {
                if self.mask[sample] == 0xFF {
                    continue
                }
                let matches = combination
                    .snps()
                    .iter()
                    .zip(cell.iter())
                    .all(|(&snp, &code)| view.column(snp)[sample] == code);
                if matches {
                    self.mask[sample] = 0xFF;
                }
            }
        }

        let blocks = [self.mask.as_slice()];
        let predicted_affected   = and_popcount(&blocks, 0, layout.padded_affected());
        let predicted_unaffected = and_popcount(&blocks, layout.padded_affected(), layout.padded_unaffected());

        ConfusionMatrix {
            true_pos : predicted_affected,
            false_neg: layout.num_affected() as u32 - predicted_affected,
            false_pos: predicted_unaffected,
            true_neg : layout.num_unaffected() as u32 - predicted_unaffected,
        }
    }
}

/// Accuracy metric scoring a confusion matrix. `None` when a denominator
/// vanishes: an unscorable combination never enters the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Evaluator {
    /// (TP + TN) / total.
    ClassificationAccuracy,
    /// Mean of sensitivity and specificity.
    #[default]
    BalancedAccuracy,
    /// Goodman-Kruskal gamma.
    Gamma,
    /// Kendall's tau-b.
    TauB,
}

impl Evaluator {
    pub fn score(&self, matrix: &ConfusionMatrix) -> Option<f64> {
        let tp = f64::from(matrix.true_pos);
        let fn_ = f64::from(matrix.false_neg);
        let fp = f64::from(matrix.false_pos);
        let tn = f64::from(matrix.true_neg);

        match self {
            Self::ClassificationAccuracy => {
                let total = tp + fn_ + fp + tn;
                (total > 0.0).then(|| (tp + tn) / total)
            }
            Self::BalancedAccuracy => {
                let affected   = tp + fn_;
                let unaffected = tn + fp;
                (affected > 0.0 && unaffected > 0.0).then(|| (tp / affected + tn / unaffected) / 2.0)
            }
            Self::Gamma => {
                let concordant = tp * tn;
                let discordant = fp * fn_;
                (concordant + discordant > 0.0).then(|| (concordant - discordant) / (concordant + discordant))
            }
            Self::TauB => {
                let product = (tp + fn_) * (tn + fp) * (tp + fp) * (tn + fn_);
                (product > 0.0).then(|| (tp * tn - fp * fn_) / product.sqrt())
            }
        }
    }
}
