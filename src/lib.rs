use std::io::Write;

use anyhow::Result;
use parser::{Cli, Commands, EpistasisArgs, EvaluatorArg, TdtArgs};

#[macro_use]
extern crate log;

/// Dispatch the requested analysis.
pub fn run(cli: Cli) -> Result<()> {
    // ----------------------------- Prepare the output workspace and keep a
    //                               record of this run's arguments.
    gwas_io::parse::create_output_directory(cli.output_dir())?;
    cli.serialize()?;

    match &cli.commands {
        Commands::Tdt(args)       => run_tdt(args),
        Commands::Epistasis(args) => run_epistasis(args),
    }
}

fn run_tdt(args: &TdtArgs) -> Result<()> {
    let mut config = tdt::TdtConfig::new(args.vcf.clone(), args.ped.clone(), args.output_dir.clone());
    config.output_filename       = args.output.clone();
    config.workers               = args.threads;
    config.batch_size            = args.batch_size;
    config.max_batches           = args.max_batches;
    config.decompression_threads = args.decompression_threads;
    config.affected              = tdt::affected_code(args.affected_code);
    if args.permute {
        config.permute = Some(tdt::seeded_family_flip(args.seed));
    }
    tdt::run(&config, &[])
}

fn run_epistasis(args: &EpistasisArgs) -> Result<()> {
    let affected = tdt::affected_code(args.affected_code);
    let dataset = epistasis::CaseControlDataset::from_files(
        &args.vcf, &args.ped, &*affected, args.decompression_threads,
    )?;

    let mut config = epistasis::EpistasisConfig::new(args.order);
    config.num_folds        = args.folds;
    config.max_ranking_size = args.ranking_size;
    config.evaluator        = evaluator(args.evaluator);
    config.threads          = args.threads;
    config.rows_per_batch   = args.batch_rows;
    let ranking = epistasis::run(&dataset, &config)?;

    // ----------------------------- Serialize the in-process ranking.
    let output_path = args.output_dir.join(&args.output);
    let mut writer = gwas_io::write::create_output_file(&output_path)?;
    writeln!(writer, " RANK      ACCURACY        CELLS   SNPS")?;
    for (rank, combination) in ranking.iter().enumerate() {
        let snps = combination
            .snps()
            .iter()
            .map(|&snp| dataset.snp(snp).to_string())
            .collect::<Vec<_>>()
            .join(",");
        writeln!(writer, "{:5}\t{:12.6}\t{:5}\t{snps}", rank + 1, combination.accuracy(), combination.num_cells())?;
    }
    writer.flush()?;
    info!("Epistasis ranking written to '{}'", output_path.display());
    Ok(())
}

fn evaluator(arg: EvaluatorArg) -> epistasis::Evaluator {
    match arg {
        EvaluatorArg::Ca    => epistasis::Evaluator::ClassificationAccuracy,
        EvaluatorArg::Ba    => epistasis::Evaluator::BalancedAccuracy,
        EvaluatorArg::Gamma => epistasis::Evaluator::Gamma,
        EvaluatorArg::TauB  => epistasis::Evaluator::TauB,
    }
}
