use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{ArgEnum, Args, Parser, Subcommand};
use log::debug;
use serde::{Deserialize, Serialize};

mod error;
pub use error::ParserError;

/// gwas-rs: family-based association and epistasis testing over VCF cohorts
#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="gwas-rs", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// Set the verbosity level (-v -vv -vvv)
    ///
    /// Set the verbosity level of this program. Multiple levels allowed {n}
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Note that the program will still output warnings by default, even when this flag is off.
    /// Use the --quiet/-q flag to disable them.
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings.
    ///
    /// By default, warnings are emitted and redirected to the console, even when verbose mode
    /// is off. Use this argument to disable this. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Logger verbosity: warnings stay on unless `--quiet` was requested.
    pub fn verbosity(&self) -> u8 {
        self.verbose + u8::from(!self.quiet)
    }

    /// The output directory of whichever subcommand was requested.
    pub fn output_dir(&self) -> &Path {
        match &self.commands {
            Commands::Tdt(args)       => &args.output_dir,
            Commands::Epistasis(args) => &args.output_dir,
        }
    }

    /// Serialize the parsed command line arguments within a `.yaml` file.
    ///
    /// # Behavior
    /// - File naming follows the convention '{current time}-{subcommand}.yaml'.
    ///   current time follows the format `YYYY`-`MM`-`DD`T`hhmmss`
    /// - The file is written at the root of the user-provided output directory,
    ///   which must already exist.
    pub fn serialize(&self) -> Result<()> {
        let serialized = serde_yaml::to_string(&self).map_err(ParserError::SerializeArgs)?;
        debug!("\n---- Command line args ----\n{serialized}\n---");

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S").to_string();
        let name = match &self.commands {
            Commands::Tdt(_)       => "tdt",
            Commands::Epistasis(_) => "epistasis",
        };
        let output_file = self.output_dir().join(format!("{current_time}-{name}.yaml"));
        std::fs::write(&output_file, serialized)
            .map_err(|source| ParserError::WriteArgs { path: output_file.clone(), source })?;
        Ok(())
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Run the transmission disequilibrium test over a VCF + pedigree cohort.
    Tdt(TdtArgs),
    /// Search SNP tuples for epistatic association over a VCF + pedigree cohort.
    Epistasis(EpistasisArgs),
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct TdtArgs {
    /// Input variant file ('.vcf' or '.vcf.gz')
    pub vcf: PathBuf,

    /// Input pedigree file (6-column PED)
    pub ped: PathBuf,

    /// Output directory (created if absent)
    pub output_dir: PathBuf,

    /// Name of the result file within the output directory
    #[clap(short='o', long, default_value = "hpg-variant.tdt")]
    pub output: String,

    /// Number of worker threads
    #[clap(short='t', long, default_value_t = 4)]
    pub threads: usize,

    /// Number of variant records per batch
    #[clap(short='b', long, default_value_t = 200)]
    pub batch_size: usize,

    /// Maximum number of in-flight batches between reader and workers
    #[clap(short='m', long, default_value_t = 4)]
    pub max_batches: usize,

    /// Phenotype value marking affected children
    #[clap(long, default_value_t = 2.0)]
    pub affected_code: f64,

    /// Swap transmitted/untransmitted alleles for a random half of the families
    #[clap(long)]
    pub permute: bool,

    /// Seed of the per-family permutation (only meaningful with --permute)
    #[clap(long, default_value_t = 0)]
    pub seed: u64,

    /// BGZF decompression threads ('.vcf.gz' inputs only)
    #[clap(long, default_value_t = 1)]
    pub decompression_threads: usize,
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct EpistasisArgs {
    /// Input variant file ('.vcf' or '.vcf.gz')
    pub vcf: PathBuf,

    /// Input pedigree file (6-column PED)
    pub ped: PathBuf,

    /// Output directory (created if absent)
    pub output_dir: PathBuf,

    /// Name of the result file within the output directory
    #[clap(short='o', long, default_value = "gwas-rs.epistasis")]
    pub output: String,

    /// Number of SNPs per combination
    #[clap(short='k', long, default_value_t = 2)]
    pub order: usize,

    /// Cross-validation folds (1 = resubstitution)
    #[clap(short='f', long, default_value_t = 5)]
    pub folds: usize,

    /// Number of combinations retained in the final ranking
    #[clap(short='n', long, default_value_t = 10)]
    pub ranking_size: usize,

    /// Accuracy metric used to score combinations
    #[clap(long, arg_enum, default_value = "ba")]
    pub evaluator: EvaluatorArg,

    /// Number of worker threads (0 = one per core)
    #[clap(short='t', long, default_value_t = 0)]
    pub threads: usize,

    /// SNP tuples sharing one mask-region refill
    #[clap(long, default_value_t = 64)]
    pub batch_rows: usize,

    /// Phenotype value marking affected samples
    #[clap(long, default_value_t = 2.0)]
    pub affected_code: f64,

    /// BGZF decompression threads ('.vcf.gz' inputs only)
    #[clap(long, default_value_t = 1)]
    pub decompression_threads: usize,
}

/// CLI-facing spelling of the accuracy metrics.
#[derive(ArgEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluatorArg {
    /// Classification accuracy
    Ca,
    /// Balanced accuracy
    Ba,
    /// Goodman-Kruskal gamma
    Gamma,
    /// Kendall's tau-b
    TauB,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).expect("arguments should parse")
    }

    #[test]
    fn tdt_positional_arguments() {
        let cli = parse(&["gwas-rs", "tdt", "cohort.vcf", "cohort.ped", "results/"]);
        let Commands::Tdt(args) = &cli.commands else { panic!("expected the tdt subcommand") };
        assert_eq!(args.vcf, PathBuf::from("cohort.vcf"));
        assert_eq!(args.ped, PathBuf::from("cohort.ped"));
        assert_eq!(args.output_dir, PathBuf::from("results/"));
        assert_eq!(args.output, "hpg-variant.tdt");
        assert_eq!(args.threads, 4);
        assert_eq!(args.batch_size, 200);
        assert_eq!(args.max_batches, 4);
        assert!(!args.permute);
    }

    #[test]
    fn tdt_overrides() {
        let cli = parse(&[
            "gwas-rs", "tdt", "a.vcf", "a.ped", "out/",
            "-o", "assoc.tdt", "-t", "8", "-b", "500", "-m", "2",
            "--permute", "--seed", "7", "--affected-code", "1.0",
        ]);
        let Commands::Tdt(args) = &cli.commands else { panic!("expected the tdt subcommand") };
        assert_eq!(args.output, "assoc.tdt");
        assert_eq!(args.threads, 8);
        assert_eq!(args.batch_size, 500);
        assert_eq!(args.max_batches, 2);
        assert!(args.permute);
        assert_eq!(args.seed, 7);
        assert_eq!(args.affected_code, 1.0);
    }

    #[test]
    fn missing_positional_arguments_fail() {
        assert!(Cli::try_parse_from(["gwas-rs", "tdt", "a.vcf"]).is_err());
        assert!(Cli::try_parse_from(["gwas-rs", "epistasis"]).is_err());
    }

    #[test]
    fn epistasis_defaults() {
        let cli = parse(&["gwas-rs", "epistasis", "a.vcf", "a.ped", "out/"]);
        let Commands::Epistasis(args) = &cli.commands else { panic!("expected the epistasis subcommand") };
        assert_eq!(args.order, 2);
        assert_eq!(args.folds, 5);
        assert_eq!(args.ranking_size, 10);
        assert_eq!(args.evaluator, EvaluatorArg::Ba);
    }

    #[test]
    fn evaluator_spellings() {
        for (spelling, expected) in [("ca", EvaluatorArg::Ca), ("ba", EvaluatorArg::Ba),
                                     ("gamma", EvaluatorArg::Gamma), ("tau-b", EvaluatorArg::TauB)] {
            let cli = parse(&["gwas-rs", "epistasis", "a.vcf", "a.ped", "out/", "--evaluator", spelling]);
            let Commands::Epistasis(args) = &cli.commands else { panic!() };
            assert_eq!(args.evaluator, expected, "spelling {spelling}");
        }
    }

    #[test]
    fn verbosity_accumulates_and_quiet_lowers() {
        let cli = parse(&["gwas-rs", "tdt", "a.vcf", "a.ped", "out/", "-vv"]);
        assert_eq!(cli.verbosity(), 3);
        let cli = parse(&["gwas-rs", "tdt", "a.vcf", "a.ped", "out/"]);
        assert_eq!(cli.verbosity(), 1);
        let cli = parse(&["gwas-rs", "tdt", "a.vcf", "a.ped", "out/", "-q"]);
        assert_eq!(cli.verbosity(), 0);
    }

    #[test]
    fn serialize_writes_a_yaml_into_the_output_dir() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let output_dir = tmpdir.path().to_str().unwrap().to_string();
        let cli = parse(&["gwas-rs", "tdt", "a.vcf", "a.ped", output_dir.as_str()]);
        cli.serialize()?;

        let yamls: Vec<_> = std::fs::read_dir(tmpdir.path())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "yaml"))
            .collect();
        assert_eq!(yamls.len(), 1);
        let contents = std::fs::read_to_string(yamls[0].path())?;
        assert!(contents.contains("a.vcf"));
        Ok(())
    }
}
