mod cli;
mod config;
mod run;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use urlcompare_core::Convention;

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Compare(args) => run::run(args),
        Command::Conventions => {
            for convention in Convention::ALL {
                println!("{:<26} {}", convention.as_str(), convention.sample());
            }
            Ok(())
        }
        Command::SampleConfig => {
            print!("{}", config::SAMPLE_CONFIG);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
