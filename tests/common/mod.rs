//! Shared fixture builders for the end-to-end tests.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write a VCF with the given sample names and data rows.
/// Each row is (chromosome, position, ref, alt, cells).
pub fn write_vcf(dir: &Path, name: &str, samples: &[&str], rows: &[(&str, u64, &str, &str, &[&str])]) -> PathBuf {
    let mut contents = String::from("##fileformat=VCFv4.2\n");
    contents.push_str("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT");
    for sample in samples {
        contents.push('\t');
        contents.push_str(sample);
    }
    contents.push('\n');
    for (chromosome, position, reference, alternate, cells) in rows {
        contents.push_str(&format!("{chromosome}\t{position}\t.\t{reference}\t{alternate}\t.\t.\t.\tGT"));
        for cell in *cells {
            contents.push('\t');
            contents.push_str(cell);
        }
        contents.push('\n');
    }

    let path = dir.join(name);
    File::create(&path).unwrap().write_all(contents.as_bytes()).unwrap();
    path
}

/// Write a PED file from raw 6-column rows.
pub fn write_ped(dir: &Path, name: &str, rows: &[[&str; 6]]) -> PathBuf {
    let mut contents = String::new();
    for row in rows {
        contents.push_str(&row.join(" "));
        contents.push('\n');
    }
    let path = dir.join(name);
    File::create(&path).unwrap().write_all(contents.as_bytes()).unwrap();
    path
}

/// Read an output file, returning its header and its sorted data lines
/// (line order across pipeline workers is unspecified).
pub fn read_sorted_output(path: &Path) -> (String, Vec<String>) {
    let contents = std::fs::read_to_string(path).unwrap();
    let mut lines = contents.lines().map(str::to_string);
    let header = lines.next().expect("output file must carry a header");
    let mut data: Vec<String> = lines.collect();
    data.sort_unstable();
    (header, data)
}
