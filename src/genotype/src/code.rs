use crate::GenotypeCall;

/// Number of genotype codes a biallelic site can take: 0/0, het, 1/1.
pub const NUM_GENOTYPE_CODES: usize = 3;

/// Sentinel code for missing or higher-order genotypes. Chosen so it can
/// never compare equal to a genotype code during mask construction.
pub const MISSING_CODE: u8 = u8::MAX;

/// Collapse a call into the compact {0, 1, 2} encoding used by the
/// combinatorial engine: reference-homozygous, heterozygous,
/// alternate-homozygous. Calls involving allele indices above 1 carry no
/// biallelic information and map to [`MISSING_CODE`], as do missing calls.
pub fn genotype_code(call: GenotypeCall) -> u8 {
    match call {
        GenotypeCall::Alleles(0, 0)                          => 0,
        GenotypeCall::Alleles(a, b) if a <= 1 && b <= 1 && a != b => 1,
        GenotypeCall::Alleles(1, 1)                          => 2,
        _                                                    => MISSING_CODE,
    }
}
