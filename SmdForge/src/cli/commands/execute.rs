//! Command execution implementations

use super::Commands;
use super::definitions::ConfigCommands;
use super::{batch, config, convert, inspect};
use crate::converter::Direction;

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Convert {
                source,
                destination,
            } => convert::execute(source, destination),
            Commands::Decode(args) => batch::execute(args, Direction::Decode),
            Commands::Encode(args) => batch::execute(args, Direction::Encode),
            Commands::Inspect { path, json } => inspect::execute(path, *json),
            Commands::Config { command } => command.execute(),
        }
    }
}

impl ConfigCommands {
    /// Execute the selected settings command.
    ///
    /// # Errors
    /// Returns an error if the settings cannot be printed.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            ConfigCommands::Show => config::show(),
            ConfigCommands::Path => config::path(),
        }
    }
}
