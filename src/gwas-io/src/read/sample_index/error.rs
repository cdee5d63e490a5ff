use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleIndexError {
    #[error("Duplicate sample identifier '{id}' in the variant stream header")]
    DuplicateSample { id: String },
}
