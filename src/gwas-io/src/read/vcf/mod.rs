use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use batch_queue::BatchQueue;
use gzp::{deflate::Bgzf, par::decompress::ParDecompressBuilder};
use log::{debug, info, warn};

mod error;
pub use error::VcfError;

/// 0-based field index at which sample genotype cells begin.
const GENOTYPES_START_FIELD: usize = 9;

/// One parsed variant line.
///
/// The per-sample genotype cells are kept as a single contiguous backing
/// string (the tail of the input line) plus byte ranges, and are indexed
/// directly through [`VariantRecord::sample_cell`]. Cell order matches the
/// sample-name list of the stream header for the lifetime of the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub chromosome: String,
    pub position  : u64,
    pub reference : String,
    pub alternate : String,
    cells : String,
    bounds: Vec<(u32, u32)>,
}

impl VariantRecord {
    pub fn new(chromosome: &str, position: u64, reference: &str, alternate: &str, cells: &[&str]) -> Self {
        Self::from_cell_region(chromosome, position, reference, alternate, &cells.join("\t"))
    }

    fn from_cell_region(chromosome: &str, position: u64, reference: &str, alternate: &str, region: &str) -> Self {
        let cells = region.to_string();
        let mut bounds = Vec::new();
        if !cells.is_empty() {
            let mut start = 0u32;
            for (i, byte) in cells.bytes().enumerate() {
                if byte == b'\t' {
                    bounds.push((start, i as u32));
                    start = i as u32 + 1;
                }
            }
            bounds.push((start, cells.len() as u32));
        }
        Self {
            chromosome: chromosome.to_string(),
            position,
            reference : reference.to_string(),
            alternate : alternate.to_string(),
            cells,
            bounds,
        }
    }

    /// Genotype cell of the sample sitting at `position` in the stream's
    /// sample-name list.
    pub fn sample_cell(&self, position: usize) -> Option<&str> {
        self.bounds.get(position).map(|&(start, end)| &self.cells[start as usize..end as usize])
    }

    pub fn num_samples(&self) -> usize {
        self.bounds.len()
    }
}

/// Streaming reader over a `.vcf` or BGZF-compressed `.vcf.gz` file.
///
/// The header is consumed on construction, yielding the ordered
/// sample-name list; data lines are then parsed one record at a time.
/// Malformed data lines are logged and dropped; only I/O failures are
/// fatal.
pub struct VcfReader {
    source : Box<dyn BufRead + Send>,
    samples: Vec<String>,
    path   : PathBuf,
    line   : String,
    number : usize,
}

impl VcfReader {
    /// Open a variant file and scan its header.
    /// `threads` only matters for BGZF decompression.
    pub fn new(path: &Path, threads: usize) -> Result<Self> {
        let loc_msg = || format!("While opening variant file '{}'", path.display());
        let mut source = Self::get_reader(path, threads).with_context(loc_msg)?;
        let (samples, header_lines) = Self::parse_sample_names(&mut source).with_context(loc_msg)?;
        info!("{} sample names read from '{}'", samples.len(), path.display());
        Ok(Self { source, samples, path: path.to_path_buf(), line: String::new(), number: header_lines })
    }

    /// Ordered sample-name list from the header line.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Parse the next data line. `Ok(None)` on end of stream. Records whose
    /// cell count disagrees with the header are dropped like any other
    /// malformed line.
    pub fn next_record(&mut self) -> Result<Option<VariantRecord>> {
        loop {
            self.line.clear();
            let read = self.source.read_line(&mut self.line)
                .map_err(VcfError::ReadLine)
                .with_context(|| format!("While reading '{}'", self.path.display()))?;
            if read == 0 {
                return Ok(None)
            }
            self.number += 1;
            let line = self.line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue
            }
            match Self::parse_record(line) {
                Ok(record) if record.num_samples() == self.samples.len() => return Ok(Some(record)),
                Ok(record) => warn!("{}: line {}: expected {} sample cells, found {}; record dropped",
                                    self.path.display(), self.number, self.samples.len(), record.num_samples()),
                Err(e)     => warn!("{}: line {}: {e}; record dropped", self.path.display(), self.number),
            }
        }
    }

    /// Pull records and push batches of up to `batch_size` onto `queue`,
    /// closing one queue writer on end of stream or on a fatal read error.
    pub fn read_batches(mut self, queue: &BatchQueue<Vec<VariantRecord>>, batch_size: usize) -> Result<()> {
        let batch_size = batch_size.max(1);
        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;
        let outcome = loop {
            match self.next_record() {
                Ok(Some(record)) => {
                    batch.push(record);
                    if batch.len() == batch_size {
                        total += batch.len();
                        queue.push(std::mem::replace(&mut batch, Vec::with_capacity(batch_size)));
                    }
                }
                Ok(None) => {
                    if !batch.is_empty() {
                        total += batch.len();
                        queue.push(std::mem::take(&mut batch));
                    }
                    break Ok(())
                }
                Err(e) => break Err(e),
            }
        };
        queue.close_writer();
        debug!("Variant source exhausted: {total} records queued");
        outcome
    }

    fn parse_record(line: &str) -> Result<VariantRecord, VcfError> {
        let mut fields = line.splitn(GENOTYPES_START_FIELD + 1, '\t');
        let mut next = |name: &'static str| fields.next().ok_or(VcfError::TruncatedRecord { field: name });

        let chromosome = next("CHROM")?;
        let position   = next("POS")?;
        let _id        = next("ID")?;
        let reference  = next("REF")?;
        let alternate  = next("ALT")?;
        for skipped in ["QUAL", "FILTER", "INFO", "FORMAT"] {
            next(skipped)?;
        }
        let region = next("sample columns")?;

        let position = position.parse::<u64>()
            .map_err(|_| VcfError::InvalidPosition { value: position.to_string() })?;
        Ok(VariantRecord::from_cell_region(chromosome, position, reference, alternate, region))
    }

    /// Check the file extension and return an appropriate buffered reader:
    /// plain `.vcf`, or a parallel BGZF decompressor for `.gz`.
    fn get_reader(path: &Path, threads: usize) -> Result<Box<dyn BufRead + Send>, VcfError> {
        use VcfError::{InvalidFileExt, Open};
        let ext  = path.extension().and_then(|ext| ext.to_str()).ok_or(InvalidFileExt)?;
        let file = File::open(path).map_err(Open)?;
        let source: Box<dyn Read + Send> = match ext {
            "vcf" => Box::new(file),
            "gz"  => {
                let decompressor = ParDecompressBuilder::<Bgzf>::new()
                    .num_threads(threads.max(1))
                    .map_err(VcfError::Decompressor)?
                    .from_reader(file);
                Box::new(decompressor)
            }
            _ => return Err(InvalidFileExt),
        };
        Ok(Box::new(BufReader::new(source)))
    }

    /// Skip meta lines until the `#CHROM` header, then extract the sample
    /// names from fields 9 onwards. Returns the names and the number of
    /// lines consumed.
    fn parse_sample_names(source: &mut Box<dyn BufRead + Send>) -> Result<(Vec<String>, usize), VcfError> {
        let mut consumed = 0;
        let mut line = String::new();
        loop {
            line.clear();
            let read = source.read_line(&mut line).map_err(VcfError::ReadLine)?;
            if read == 0 {
                return Err(VcfError::MissingHeader)
            }
            consumed += 1;
            if line.starts_with("##") {
                continue
            }
            if line.starts_with("#CHROM") {
                let samples = line.trim_end().split('\t')
                    .skip(GENOTYPES_START_FIELD)
                    .map(str::to_string)
                    .collect();
                return Ok((samples, consumed))
            }
            return Err(VcfError::MissingHeader)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const HEADER: &str = "\
##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tfather\tmother\tchild
";

    fn write_vcf(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".vcf").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn header_sample_names() -> Result<()> {
        let file = write_vcf(HEADER);
        let reader = VcfReader::new(file.path(), 1)?;
        assert_eq!(reader.samples(), &["father", "mother", "child"]);
        Ok(())
    }

    #[test]
    fn parse_data_line() -> Result<()> {
        let contents = format!("{HEADER}1\t12345\trs99\tA\tC\t50\tPASS\t.\tGT\t0/0\t0/1\t0|1\n");
        let file = write_vcf(&contents);
        let mut reader = VcfReader::new(file.path(), 1)?;

        let record = reader.next_record()?.expect("expected one record");
        assert_eq!(record.chromosome, "1");
        assert_eq!(record.position, 12345);
        assert_eq!(record.reference, "A");
        assert_eq!(record.alternate, "C");
        assert_eq!(record.num_samples(), 3);
        assert_eq!(record.sample_cell(0), Some("0/0"));
        assert_eq!(record.sample_cell(1), Some("0/1"));
        assert_eq!(record.sample_cell(2), Some("0|1"));
        assert_eq!(record.sample_cell(3), None);

        assert!(reader.next_record()?.is_none());
        Ok(())
    }

    #[test]
    fn malformed_lines_are_dropped() -> Result<()> {
        let contents = format!(
            "{HEADER}1\tnot_a_position\t.\tA\tC\t.\t.\t.\tGT\t0/0\t0/1\t1/1\n\
             1\t200\t.\tA\tC\t.\t.\t.\tGT\t0/0\t0/1\n\
             1\t300\t.\tA\tC\t.\t.\t.\tGT\t0/0\t0/1\t1/1\n"
        );
        let file = write_vcf(&contents);
        let mut reader = VcfReader::new(file.path(), 1)?;

        let record = reader.next_record()?.expect("the valid record should survive");
        assert_eq!(record.position, 300);
        assert!(reader.next_record()?.is_none());
        Ok(())
    }

    #[test]
    fn missing_header_is_fatal() {
        let file = write_vcf("1\t100\t.\tA\tC\t.\t.\t.\tGT\t0/0\n");
        assert!(VcfReader::new(file.path(), 1).is_err());
    }

    #[test]
    fn batches_honor_batch_size_and_close() -> Result<()> {
        let mut contents = HEADER.to_string();
        for pos in 1..=5u64 {
            contents.push_str(&format!("1\t{pos}\t.\tA\tC\t.\t.\t.\tGT\t0/0\t0/1\t1/1\n"));
        }
        let file = write_vcf(&contents);
        let reader = VcfReader::new(file.path(), 1)?;

        let queue = BatchQueue::open("test-batches", 8, 1);
        reader.read_batches(&queue, 2)?;

        let sizes: Vec<usize> = std::iter::from_fn(|| queue.pop()).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(queue.pop(), None); // Writer closed.
        Ok(())
    }

    #[test]
    fn record_cell_roundtrip() {
        let record = VariantRecord::new("2", 42, "G", "T", &["0/0", "1/1", "./."]);
        assert_eq!(record.num_samples(), 3);
        assert_eq!(record.sample_cell(2), Some("./."));
    }
}
