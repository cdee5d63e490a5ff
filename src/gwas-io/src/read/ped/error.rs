use thiserror::Error;

#[derive(Debug, Error)]
pub enum PedError {
    #[error("Failed to open pedigree file")]
    Open(#[source] std::io::Error),

    #[error("Failed to read pedigree line")]
    ReadLine(#[source] std::io::Error),

    #[error("Line {number}: expected at least 6 fields, found {found}")]
    TruncatedLine { number: usize, found: usize },

    #[error("Line {number}: invalid {field} field '{value}'")]
    InvalidField { number: usize, field: &'static str, value: String },
}
