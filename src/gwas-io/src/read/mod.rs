pub mod ped;
pub use ped::{Family, Individual, Pedigree};

pub mod vcf;
pub use vcf::{VariantRecord, VcfReader};

pub mod sample_index;
pub use sample_index::SampleIndex;
