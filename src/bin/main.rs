use std::process;

use clap::Parser;

#[macro_use]
extern crate log;

/// Parse command line arguments and run the requested analysis.
fn main() {
    // ----------------------------- Run CLI Parser
    let cli = parser::Cli::parse();
    // ----------------------------- Init logger.
    logger::init(cli.verbosity());

    if let Err(e) = gwas_rs::run(cli) {
        error!("{e:?}");
        process::exit(1);
    }
}
