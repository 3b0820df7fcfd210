//! # SmdForge
//!
//! A pure-Rust codec for StudioMDL character models as shipped by the two
//! Pixelmon mod releases.
//!
//! ## Supported Formats
//!
//! - **SMD** - Human-readable StudioMDL text
//! - **BMD** - Packed big-endian binary (Reforged)
//! - **SMDX** - MessagePack typed binary (Generations)
//!
//! Every format reads into and writes from the same block model
//! ([`SmdFile`]), so any pair of formats converts through it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use smdforge::converter::convert_file;
//!
//! // Decode a Reforged model to text
//! convert_file("body.bmd", "body.smd")?;
//! # Ok::<(), smdforge::Error>(())
//! ```
//!
//! ### Batch Conversion
//!
//! ```no_run
//! use std::path::Path;
//! use smdforge::converter::{BatchOptions, Direction, Variant, batch_convert};
//!
//! let options = BatchOptions::new(Variant::Generations, Direction::Decode);
//! let result = batch_convert(Path::new("models"), Path::new("out"), &options, |_| {})?;
//! println!("{} of {} files converted", result.successful, result.processed);
//! # Ok::<(), smdforge::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `smdforge` command-line binary

pub mod config;
pub mod converter;
pub mod error;
pub mod formats;
pub mod inspect;
pub mod utils;

#[cfg(feature = "cli")]
pub mod cli;

// Re-exports for convenience
pub use error::{Error, Result};
pub use formats::smd::SmdFile;

/// Crate version, written to error logs
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::formats::smd::{
        Block, BlockKind, Bone, BoneState, Keyframe, Link, MaterialTable, NodesBlock,
        SkeletonBlock, SmdFile, Triangle, TrianglesBlock, Vertex, VertexAnimationBlock,
        VertexState,
    };
    pub use crate::formats::text::{TextReader, parse_smd, read_smd, to_smd_string, write_smd};
    pub use crate::formats::bmd::{parse_bmd_bytes, read_bmd, serialize_bmd, write_bmd};
    pub use crate::formats::smdx::{parse_smdx_bytes, read_smdx, serialize_smdx, write_smdx};

    pub use crate::converter::{
        BatchOptions, BatchProgress, BatchResult, Direction, FileAction, ModelFormat, Variant,
        batch_convert, convert_file, read_model, write_model,
    };
    pub use crate::config::Config;
    pub use crate::inspect::{ModelSummary, inspect_file};
}
