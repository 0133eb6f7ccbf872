//! CLI argument parsing for the inspection-worker binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::services::import::SourceEncoding;
use crate::types::ImportKind;

#[derive(Parser)]
#[command(name = "inspection-worker", about = "Equipment inspection ledger worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Import one CSV file and print the result as JSON
    Import {
        target: ImportTarget,
        path: PathBuf,
        /// Source encoding (sjis, utf-8); defaults per target
        #[arg(long)]
        encoding: Option<SourceEncoding>,
        /// Process every row, then roll back
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportTarget {
    Devices,
    InspectionItems,
    InspectionItemNames,
}

impl From<ImportTarget> for ImportKind {
    fn from(target: ImportTarget) -> Self {
        match target {
            ImportTarget::Devices => ImportKind::Device,
            ImportTarget::InspectionItems => ImportKind::InspectionItem,
            ImportTarget::InspectionItemNames => ImportKind::InspectionItemName,
        }
    }
}
