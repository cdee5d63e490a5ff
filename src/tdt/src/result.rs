use std::fmt;

/// Sentinel reported when the χ² statistic is undefined (no transmissions).
pub const UNDEFINED_CHI_SQUARE: f64 = -1.0;

/// Header line of the TDT output file.
pub const OUTPUT_HEADER: &str =
    " CHR          BP       A1      A2       T       U          OR            CHISQ            P";

/// Per-variant outcome of the transmission-disequilibrium test.
///
/// `t1` counts reference-allele transmissions, `t2` alternate-allele
/// transmissions, both from heterozygous parents to affected children.
#[derive(Debug, Clone, PartialEq)]
pub struct TdtResult {
    pub chromosome: String,
    pub position  : u64,
    pub reference : String,
    pub alternate : String,
    pub t1        : u32,
    pub t2        : u32,
    pub odds_ratio: f64,
    pub chi_square: f64,
}

impl TdtResult {
    pub fn new(chromosome: &str, position: u64, reference: &str, alternate: &str, t1: u32, t2: u32) -> Self {
        let total = t1 + t2;
        let chi_square = match total {
            0 => UNDEFINED_CHI_SQUARE,
            _ => (f64::from(t1) - f64::from(t2)).powi(2) / f64::from(total),
        };
        let odds_ratio = match t2 {
            0 => f64::NAN,
            _ => f64::from(t1) / f64::from(t2),
        };
        Self {
            chromosome: chromosome.to_string(),
            position,
            reference : reference.to_string(),
            alternate : alternate.to_string(),
            t1,
            t2,
            odds_ratio,
            chi_square,
        }
    }
}

impl fmt::Display for TdtResult {
    /// One output-file line. Field layout:
    /// chromosome, position (12 wide), ref, alt, t1, t2, OR, χ².
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{:12}\t{}\t{}\t{}\t{}\t{:8.6}\t{:6.6}",
            self.chromosome, self.position, self.reference, self.alternate,
            self.t1, self.t2, self.odds_ratio, self.chi_square
        )
    }
}
