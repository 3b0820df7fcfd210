//! Subcommand enum definitions for CLI

use clap::Subcommand;

/// Settings commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings as JSON
    Show,

    /// Print the settings file location
    Path,
}
