//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{export::ExportArgs, fetch::FetchArgs};

/// Export Farcaster casts to JSON or CSV.
#[derive(Parser, Debug)]
#[command(name = "castex")]
#[command(author, version = env!("CASTEX_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every cast for an account and publish it as a file
    Export(ExportArgs),

    /// Fetch every cast for an account and print it as JSON lines
    Fetch(FetchArgs),
}
