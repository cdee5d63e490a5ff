use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};

mod error;
pub use error::WriteError;

/// Create a buffered writer over a fresh output file.
pub fn create_output_file(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .map_err(WriteError::Create)
        .with_context(|| format!("While creating output file '{}'", path.display()))?;
    Ok(BufWriter::new(file))
}
