use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcfError {
    #[error("Invalid or missing file extension. Accepted formats are ['.vcf', '.vcf.gz']")]
    InvalidFileExt,

    #[error("Failed to open variant file")]
    Open(#[source] std::io::Error),

    #[error("Failed to initialize the BGZF decompressor")]
    Decompressor(#[source] gzp::GzpError),

    #[error("Failed to read from the variant file")]
    ReadLine(#[source] std::io::Error),

    #[error("Reached end of file without finding a '#CHROM' header line")]
    MissingHeader,

    #[error("truncated record: missing {field} field")]
    TruncatedRecord { field: &'static str },

    #[error("invalid position field '{value}'")]
    InvalidPosition { value: String },
}
