use std::hash::{BuildHasher, Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

use gwas_io::read::Family;

/// Default name of the result file inside the output directory.
pub const DEFAULT_OUTPUT_FILENAME: &str = "hpg-variant.tdt";

/// Decides whether a phenotype value counts as "affected".
pub type AffectedPredicate = Arc<dyn Fn(f64) -> bool + Send + Sync>;

/// Decides, once per family, whether this run swaps the transmitted and
/// untransmitted alleles of that family's heterozygous parents.
pub type PermuteCall = Arc<dyn Fn(&Family) -> bool + Send + Sync>;

/// Settings of a transmission-disequilibrium run.
pub struct TdtConfig {
    pub vcf                  : PathBuf,
    pub ped                  : PathBuf,
    pub output_dir           : PathBuf,
    pub output_filename      : String,
    /// Worker-pool size.
    pub workers              : usize,
    /// Records per batch pushed by the reader.
    pub batch_size           : usize,
    /// Maximum in-flight batches between reader and workers.
    pub max_batches          : usize,
    /// BGZF decompression threads (only relevant for `.vcf.gz` input).
    pub decompression_threads: usize,
    pub affected             : AffectedPredicate,
    pub permute              : Option<PermuteCall>,
}

impl TdtConfig {
    pub fn new(vcf: PathBuf, ped: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            vcf,
            ped,
            output_dir,
            output_filename      : DEFAULT_OUTPUT_FILENAME.to_string(),
            workers              : 4,
            batch_size           : 200,
            max_batches          : 4,
            decompression_threads: 1,
            affected             : affected_code(2.0),
            permute              : None,
        }
    }
}

/// Predicate matching one exact phenotype code. The conventional coding
/// marks affected children with `2.0`; 0/1-coded studies pass `1.0`.
pub fn affected_code(code: f64) -> AffectedPredicate {
    Arc::new(move |phenotype| phenotype == code)
}

/// A deterministic 50:50 per-family flip, keyed by the run seed and the
/// family identifier. Two runs with the same seed flip the same families.
pub fn seeded_family_flip(seed: u64) -> PermuteCall {
    let state = ahash::RandomState::with_seed(seed as usize);
    Arc::new(move |family: &Family| {
        let mut hasher = state.build_hasher();
        family.id.hash(&mut hasher);
        hasher.finish() & 1 == 1
    })
}
