use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::converter::Variant;

pub mod batch;
pub mod config;
pub mod convert;
pub mod definitions;
pub mod execute;
pub mod inspect;

pub use definitions::ConfigCommands;

/// Options shared by `decode` and `encode`
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Input directory (or .jar/.zip archive when decoding)
    pub input: PathBuf,

    /// Output directory
    pub output: PathBuf,

    /// Release variant: reforged (.bmd) or generations (.smdx)
    #[arg(long)]
    pub variant: Option<Variant>,

    /// Convert one file at a time
    #[arg(long)]
    pub sequential: bool,

    /// Stop at the first failed file
    #[arg(long)]
    pub stop_on_error: bool,

    /// Directory for the failure log (overrides the config)
    #[arg(long)]
    pub error_log: Option<PathBuf>,

    /// Suppress progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a single model file between .smd, .bmd and .smdx
    Convert {
        /// Source model file
        #[arg(short, long)]
        source: PathBuf,

        /// Destination model file
        #[arg(short, long)]
        destination: PathBuf,
    },

    /// Decode binary models in a directory or archive to .smd text
    Decode(BatchArgs),

    /// Encode .smd text models in a directory to binary
    Encode(BatchArgs),

    /// Show block and record counts for a model file
    Inspect {
        /// Model file (.smd, .bmd or .smdx)
        path: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or locate the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}
