use std::fmt;
use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};
use log::{info, warn};

use genotype::{genotype_code, GenotypeCall, MISSING_CODE};
use gwas_io::read::{Pedigree, VcfReader};

use crate::error::EpistasisError;
use crate::masks::MaskLayout;

/// Identity of one SNP of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnpId {
    pub chromosome: String,
    pub position  : u64,
    pub reference : String,
    pub alternate : String,
}

impl fmt::Display for SnpId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.chromosome, self.position)
    }
}

/// Genotype-code matrix of a case/control cohort.
///
/// One row of codes per SNP; within a row, samples are ordered affected
/// first, then unaffected. Codes are {0, 1, 2} or [`MISSING_CODE`].
pub struct CaseControlDataset {
    snps          : Vec<SnpId>,
    genotypes     : Vec<u8>,
    num_affected  : usize,
    num_unaffected: usize,
}

impl CaseControlDataset {
    /// Assemble the dataset by joining a variant stream against a pedigree.
    ///
    /// Phenotypes come from the pedigree; `affected` decides the case
    /// group. Samples without a pedigree record are excluded (and counted
    /// in a warning). Either group ending up empty is fatal: every
    /// evaluation metric would be degenerate.
    pub fn from_files(
        vcf                  : &Path,
        ped                  : &Path,
        affected             : &(dyn Fn(f64) -> bool + Send + Sync),
        decompression_threads: usize,
    ) -> Result<Self> {
        let pedigree = Pedigree::read(ped)?;
        let phenotypes: AHashMap<String, f64> = pedigree
            .individuals()
            .map(|individual| (individual.id.to_ascii_lowercase(), individual.phenotype))
            .collect();

        let mut reader = VcfReader::new(vcf, decompression_threads)?;

        let mut affected_columns   = Vec::new();
        let mut unaffected_columns = Vec::new();
        let mut unknown = 0usize;
        for (column, name) in reader.samples().iter().enumerate() {
            match phenotypes.get(&name.to_ascii_lowercase()) {
                Some(&phenotype) if affected(phenotype) => affected_columns.push(column),
                Some(_) => unaffected_columns.push(column),
                None    => unknown += 1,
            }
        }
        if unknown > 0 {
            warn!("{unknown} variant-stream samples have no pedigree record and were excluded");
        }
        if affected_columns.is_empty() {
            return Err(EpistasisError::NoAffectedSamples).context("While assembling the case/control dataset")
        }
        if unaffected_columns.is_empty() {
            return Err(EpistasisError::NoUnaffectedSamples).context("While assembling the case/control dataset")
        }

        let mut snps      = Vec::new();
        let mut genotypes = Vec::new();
        while let Some(record) = reader.next_record()? {
            for &column in affected_columns.iter().chain(unaffected_columns.iter()) {
                let code = record
                    .sample_cell(column)
                    .map_or(MISSING_CODE, |cell| genotype_code(GenotypeCall::decode(cell)));
                genotypes.push(code);
            }
            snps.push(SnpId {
                chromosome: record.chromosome,
                position  : record.position,
                reference : record.reference,
                alternate : record.alternate,
            });
        }

        info!(
            "Epistasis dataset: {} SNPs x {} samples ({} affected / {} unaffected)",
            snps.len(),
            affected_columns.len() + unaffected_columns.len(),
            affected_columns.len(),
            unaffected_columns.len()
        );
        Ok(Self {
            snps,
            genotypes,
            num_affected  : affected_columns.len(),
            num_unaffected: unaffected_columns.len(),
        })
    }

    /// Build a dataset from pre-decoded code rows (one per SNP, affected
    /// samples first).
    pub fn from_codes(snps: Vec<SnpId>, genotypes: Vec<u8>, num_affected: usize, num_unaffected: usize) -> Self {
        assert_eq!(genotypes.len(), snps.len() * (num_affected + num_unaffected), "genotype matrix shape mismatch");
        Self { snps, genotypes, num_affected, num_unaffected }
    }

    pub fn num_snps(&self) -> usize {
        self.snps.len()
    }

    pub fn num_samples(&self) -> usize {
        self.num_affected + self.num_unaffected
    }

    pub fn num_affected(&self) -> usize {
        self.num_affected
    }

    pub fn num_unaffected(&self) -> usize {
        self.num_unaffected
    }

    pub fn snp(&self, index: usize) -> &SnpId {
        &self.snps[index]
    }

    /// All sample codes of one SNP, affected first.
    pub fn column(&self, snp: usize) -> &[u8] {
        let samples = self.num_samples();
        &self.genotypes[snp * samples..(snp + 1) * samples]
    }
}

/// One cross-validation fold, as global sample indices into the dataset
/// (affected samples occupy `0..A`, unaffected `A..A+U`).
#[derive(Debug, Clone)]
pub struct Fold {
    pub training_affected    : Vec<usize>,
    pub training_unaffected  : Vec<usize>,
    pub validation_affected  : Vec<usize>,
    pub validation_unaffected: Vec<usize>,
}

impl Fold {
    /// Round-robin partition of the cohort into `num_folds` folds. Fold `f`
    /// validates on every sample whose within-group rank is ≡ f (mod
    /// folds) and trains on the rest. With fewer than two folds the single
    /// fold trains and validates on the full cohort (resubstitution).
    pub fn partition(num_affected: usize, num_unaffected: usize, num_folds: usize) -> Vec<Fold> {
        let affected  : Vec<usize> = (0..num_affected).collect();
        let unaffected: Vec<usize> = (num_affected..num_affected + num_unaffected).collect();
        if num_folds <= 1 {
            return vec![Fold {
                training_affected    : affected.clone(),
                training_unaffected  : unaffected.clone(),
                validation_affected  : affected,
                validation_unaffected: unaffected,
            }]
        }

        let split = |group: &[usize], fold: usize| {
            let validation: Vec<usize> = group.iter().copied().skip(fold).step_by(num_folds).collect();
            let training  : Vec<usize> = group.iter().copied()
                .enumerate()
                .filter(|(rank, _)| rank % num_folds != fold)
                .map(|(_, sample)| sample)
                .collect();
            (training, validation)
        };

        (0..num_folds)
            .map(|fold| {
                let (training_affected, validation_affected)     = split(&affected, fold);
                let (training_unaffected, validation_unaffected) = split(&unaffected, fold);
                Fold { training_affected, training_unaffected, validation_affected, validation_unaffected }
            })
            .collect()
    }
}

/// Mask-ready genotype columns of one fold side (training or validation):
/// per SNP, the fold's affected codes padded to the lane width, then its
/// unaffected codes, padded likewise with [`MISSING_CODE`].
pub struct FoldView {
    layout : MaskLayout,
    columns: Vec<u8>,
}

impl FoldView {
    pub fn build(dataset: &CaseControlDataset, affected: &[usize], unaffected: &[usize]) -> Self {
        let layout  = MaskLayout::new(affected.len(), unaffected.len());
        let samples = layout.samples_per_mask();
        let mut columns = vec![MISSING_CODE; dataset.num_snps() * samples];

        for snp in 0..dataset.num_snps() {
            let source = dataset.column(snp);
            let column = &mut columns[snp * samples..(snp + 1) * samples];
            for (rank, &sample) in affected.iter().enumerate() {
                column[rank] = source[sample];
            }
            let unaffected_start = layout.padded_affected();
            for (rank, &sample) in unaffected.iter().enumerate() {
                column[unaffected_start + rank] = source[sample];
            }
        }
        Self { layout, columns }
    }

    pub fn training(dataset: &CaseControlDataset, fold: &Fold) -> Self {
        Self::build(dataset, &fold.training_affected, &fold.training_unaffected)
    }

    pub fn validation(dataset: &CaseControlDataset, fold: &Fold) -> Self {
        Self::build(dataset, &fold.validation_affected, &fold.validation_unaffected)
    }

    pub fn layout(&self) -> &MaskLayout {
        &self.layout
    }

    /// The padded code column of one SNP.
    pub fn column(&self, snp: usize) -> &[u8] {
        let samples = self.layout.samples_per_mask();
        &self.columns[snp * samples..(snp + 1) * samples]
    }
}
