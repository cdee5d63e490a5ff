use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::trace;

mod error;
pub use error::ParseError;

/// Attempt to create an output directory (and any missing ancestor).
/// A directory that already exists is not an error; any other failure is.
pub fn create_output_directory(path: &Path) -> Result<()> {
    use ParseError::CreateOutputDirectory;
    fs::create_dir_all(path)
        .map_err(CreateOutputDirectory)
        .with_context(|| format!("While attempting to create output directory '{}'", path.display()))?;
    trace!("Output directory ready: {}", path.display());
    Ok(())
}

/// Ensure an input file exists before handing it to a reader, so missing
/// inputs fail with a clear message rather than a bare ENOENT downstream.
pub fn check_input_file(path: &Path) -> Result<()> {
    use ParseError::MissingInput;
    match path.is_file() {
        true  => Ok(()),
        false => Err(MissingInput { path: path.to_path_buf() })
            .context("Please ensure the file exists and carries read permissions"),
    }
}
