//! Command-line interface for the `storefront` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::app_system::Verbosity;

/// storefront - order lifecycle and payment orchestration
///
/// Runs an in-memory storefront and walks an order from checkout through
/// payment, fulfilment and refund, logging every step.
#[derive(Debug, Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the end-to-end order walkthrough (default)
    Demo,
    /// Print the effective configuration as JSON
    Config,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }

    pub fn selected_command(&self) -> Command {
        self.command.unwrap_or(Command::Demo)
    }
}
