//! Model conversion
//!
//! Handles conversions between the three model encodings:
//! - SMD (text) - Human-readable StudioMDL source
//! - BMD (packed binary) - Reforged release models
//! - SMDX (MessagePack) - Generations release models
//!
//! Every conversion goes through the block model, so any pair works,
//! binary to binary included.

mod archive;
pub mod batch;
mod error_log;
mod variant;

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::formats::smd::SmdFile;
use crate::formats::text::TextReader;
use crate::formats::{bmd, smdx, text};
use crate::utils::extension_of;

pub use archive::{ArchiveEntry, is_archive, list_model_entries, read_entry};
pub use batch::{
    BatchFailure, BatchOptions, BatchPhase, BatchProgress, BatchResult, batch_convert,
    find_model_files,
};
pub use error_log::write_error_log;
pub use variant::{Direction, FileAction, Variant};

/// On-disk model encodings, recognised by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    /// `.smd` text
    Text,
    /// `.bmd` packed binary
    Bmd,
    /// `.smdx` MessagePack
    Smdx,
}

impl ModelFormat {
    pub const ALL: [ModelFormat; 3] = [ModelFormat::Text, ModelFormat::Bmd, ModelFormat::Smdx];

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "smd",
            Self::Bmd => bmd::BMD_EXTENSION,
            Self::Smdx => smdx::SMDX_EXTENSION,
        }
    }

    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        extension_of(path).and_then(|ext| Self::from_extension(&ext))
    }

    #[must_use]
    pub fn is_binary(self) -> bool {
        self != Self::Text
    }

    /// Decode bytes in this format
    pub fn decode(self, data: &[u8]) -> Result<SmdFile> {
        match self {
            Self::Text => {
                text::parse_smd(std::str::from_utf8(data)?)
            }
            Self::Bmd => bmd::parse_bmd_bytes(data),
            Self::Smdx => smdx::parse_smdx_bytes(data),
        }
    }

    /// Encode a model in this format
    pub fn encode(self, file: &SmdFile) -> Result<Vec<u8>> {
        match self {
            Self::Text => Ok(text::to_smd_string(file).into_bytes()),
            Self::Bmd => bmd::serialize_bmd(file),
            Self::Smdx => smdx::serialize_smdx(file),
        }
    }
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

fn format_of(path: &Path) -> Result<ModelFormat> {
    ModelFormat::from_path(path).ok_or_else(|| {
        Error::InvalidPath(format!(
            "{} is not a .smd, .bmd or .smdx file",
            path.display()
        ))
    })
}

/// Read any supported model file, picking the reader by extension
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<SmdFile> {
    let path = path.as_ref();
    let format = format_of(path)?;
    let data = fs::read(path).map_err(|e| Error::from(e).in_file(path))?;
    format.decode(&data).map_err(|e| e.in_file(path))
}

/// Write a model, picking the writer by extension
pub fn write_model<P: AsRef<Path>>(file: &SmdFile, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = format_of(path)?.encode(file).map_err(|e| e.in_file(path))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// Convert one model file to another encoding, routed by the two extensions
///
/// Text bound for the packed encoder is read leniently.
pub fn convert_file<P: AsRef<Path>>(source: P, dest: P) -> Result<()> {
    let (source, dest) = (source.as_ref(), dest.as_ref());
    let (from, to) = match (ModelFormat::from_path(source), ModelFormat::from_path(dest)) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(Error::UnsupportedConversion {
                from: extension_of(source).unwrap_or_default(),
                to: extension_of(dest).unwrap_or_default(),
            });
        }
    };
    tracing::info!("Converting {from}→{to}: {:?} → {:?}", source, dest);

    let model = match (from, to) {
        (ModelFormat::Text, ModelFormat::Bmd) => {
            let text = fs::read_to_string(source).map_err(|e| Error::from(e).in_file(source))?;
            TextReader::lenient()
                .read(&text)
                .map_err(|e| e.in_file(source))?
        }
        _ => read_model(source)?,
    };
    write_model(&model, dest)?;

    tracing::info!("Conversion complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ModelFormat::from_path("a/b.SMD"), Some(ModelFormat::Text));
        assert_eq!(ModelFormat::from_path("a/b.bmd"), Some(ModelFormat::Bmd));
        assert_eq!(ModelFormat::from_path("a/b.smdx"), Some(ModelFormat::Smdx));
        assert_eq!(ModelFormat::from_path("a/b.pqc"), None);
    }

    #[test]
    fn test_unsupported_pair() {
        let err = convert_file("model.obj", "model.smd").unwrap_err();
        assert_eq!(err.to_string(), "unsupported conversion: obj -> smd");
    }
}
