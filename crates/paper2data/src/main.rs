mod cli;
mod config;
mod dataset;
mod logging;
mod ocr_client;
mod pipeline;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = if cli.verbose {
        true
    } else {
        logging::env_flag()
    };
    logging::init(verbose);
    match cli.command {
        Command::Run {
            reference,
            users,
            existing,
            output,
        } => pipeline::run(reference, users, existing, output),
        Command::Columns { reference } => pipeline::run_columns(reference),
    }
}
