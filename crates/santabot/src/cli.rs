use clap::{Parser, Subcommand};
use santacore::export::ExportFormat;

#[derive(Parser)]
#[command(name = "santabot")]
#[command(author, version, about = "Secret Santa registration bot and admin panel", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the user bot and the admin bot (default)
    Run,

    /// Apply database migrations and exit
    Migrate,

    /// Dump all participants
    Export {
        /// Output format: csv, json or txt
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
