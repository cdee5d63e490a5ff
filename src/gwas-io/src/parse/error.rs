use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to create output directory")]
    CreateOutputDirectory(#[source] std::io::Error),

    #[error("Missing input file: '{}'", path.display())]
    MissingInput { path: PathBuf },
}
