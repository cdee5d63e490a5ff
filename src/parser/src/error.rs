use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Failed to serialize command line arguments")]
    SerializeArgs(#[source] serde_yaml::Error),

    #[error("Unable to serialize arguments into '{}'", path.display())]
    WriteArgs { path: PathBuf, source: std::io::Error },
}
