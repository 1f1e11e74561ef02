//! Command line interface

pub mod commands;

use clap::{Parser, Subcommand};

use commands::{ApplyCommand, PreviewCommand};

#[derive(Parser)]
#[command(
    name = "sheetmap",
    version,
    about = "Map spreadsheet columns onto records and apply them"
)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stage a spreadsheet and show its header, sample rows and mappable fields
    ///
    /// The staged file is kept until `apply --discard`. Sessions older than
    /// `cleanup_after_secs` are removed the next time sheetmap runs.
    Preview(PreviewCommand),
    /// Apply a column mapping to a staged spreadsheet
    Apply(ApplyCommand),
}
