pub mod config;
pub use config::{affected_code, seeded_family_flip, TdtConfig, DEFAULT_OUTPUT_FILENAME};

pub mod filter;
pub use filter::VariantFilter;

pub mod kernel;

pub mod result;
pub use result::TdtResult;

mod pipeline;
pub use pipeline::run;

mod error;
pub use error::TdtError;
