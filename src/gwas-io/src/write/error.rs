use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create output file")]
    Create(#[source] std::io::Error),
}
