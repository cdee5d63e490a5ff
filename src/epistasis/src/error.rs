use thiserror::Error;

#[derive(Debug, Error)]
pub enum EpistasisError {
    #[error("The cohort contains no affected sample")]
    NoAffectedSamples,

    #[error("The cohort contains no unaffected sample")]
    NoUnaffectedSamples,

    #[error("Invalid tuple order {order} for a dataset of {num_snps} SNPs")]
    InvalidOrder { order: usize, num_snps: usize },

    #[error("Cannot split {affected} affected / {unaffected} unaffected samples into {folds} folds")]
    TooManyFolds { folds: usize, affected: usize, unaffected: usize },
}
