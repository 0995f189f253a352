use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "paper2data", about = "Extract tabular data from scanned documents")]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one batch: infer the table structure from the reference document
    /// and extract matching rows from every user document.
    Run {
        /// The reference document whose content defines the columns.
        #[arg(long)]
        reference: PathBuf,
        /// A user document to extract rows from; repeat for each document.
        #[arg(long = "user", required = true)]
        users: Vec<PathBuf>,
        /// Previously exported dataset to append to (columns must match).
        #[arg(long)]
        existing: Option<PathBuf>,
        /// Where to write the final spreadsheet.
        #[arg(long)]
        output: PathBuf,
    },
    /// Infer and print the column schema for a reference document.
    Columns {
        #[arg(long)]
        reference: PathBuf,
    },
}
