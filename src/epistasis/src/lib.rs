pub mod dataset;
pub use dataset::{CaseControlDataset, Fold, FoldView, SnpId};

pub mod masks;
pub use masks::{MaskBuffer, MaskLayout};

pub mod counts;
pub use counts::{combination_counts, GenotypeCells};

pub mod classify;
pub use classify::{choose_high_risk, RiskRule, RuleAux};

pub mod eval;
pub use eval::{ConfusionBuilder, ConfusionMatrix, Evaluator};

pub mod risky;
pub use risky::RiskyCombination;

pub mod ranking;
pub use ranking::{Ranking, RankingOutcome};

mod driver;
pub use driver::{run, EpistasisConfig};

mod error;
pub use error::EpistasisError;
