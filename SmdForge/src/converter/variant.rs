//! Mod release variants and file routing
//!
//! Each variant pairs the text format with one binary encoding. Batch runs
//! use the variant to decide, per file, whether to decode, encode, copy the
//! file through untouched, or ignore it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ModelFormat;
use crate::error::{Error, Result};
use crate::formats::smd::SmdFile;
use crate::formats::text::TextReader;

/// Which binary encoding a batch targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Packed `.bmd` models
    #[default]
    Reforged,
    /// MessagePack `.smdx` models
    Generations,
}

/// Conversion direction relative to the binary encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Binary to text
    Decode,
    /// Text to binary
    Encode,
}

/// What a batch does with one input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileAction {
    Decode,
    Encode,
    /// Copy through unchanged
    Clone,
    Skip,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Reforged, Variant::Generations];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Reforged => "reforged",
            Self::Generations => "generations",
        }
    }

    /// The binary format this variant reads and writes
    #[must_use]
    pub fn binary_format(self) -> ModelFormat {
        match self {
            Self::Reforged => ModelFormat::Bmd,
            Self::Generations => ModelFormat::Smdx,
        }
    }

    #[must_use]
    pub fn binary_extension(self) -> &'static str {
        self.binary_format().extension()
    }

    /// Suffixes a decode run picks up: the binary suffix plus pass-through files
    #[must_use]
    pub fn decode_suffixes(self) -> &'static [&'static str] {
        match self {
            Self::Reforged => &[".bmd", ".smd", ".pqc"],
            Self::Generations => &[".smdx", ".smd", ".pqc"],
        }
    }

    /// Suffixes an encode run picks up
    #[must_use]
    pub fn encode_suffixes(self) -> &'static [&'static str] {
        &[".smd"]
    }

    #[must_use]
    pub fn suffixes(self, direction: Direction) -> &'static [&'static str] {
        match direction {
            Direction::Decode => self.decode_suffixes(),
            Direction::Encode => self.encode_suffixes(),
        }
    }

    /// Route a file by its name
    pub fn classify(self, path: &Path, direction: Direction) -> FileAction {
        let Some(name) = path.file_name() else {
            return FileAction::Skip;
        };
        let name = name.to_string_lossy().to_ascii_lowercase();
        let Some(suffix) = self
            .suffixes(direction)
            .iter()
            .find(|suffix| name.ends_with(*suffix))
        else {
            return FileAction::Skip;
        };

        let binary = &suffix[1..] == self.binary_extension();
        match direction {
            Direction::Decode if binary => FileAction::Decode,
            Direction::Decode => FileAction::Clone,
            Direction::Encode => FileAction::Encode,
        }
    }

    /// Decode this variant's binary bytes
    pub fn decode(self, data: &[u8]) -> Result<SmdFile> {
        self.binary_format().decode(data)
    }

    /// Parse text bound for this variant's encoder
    ///
    /// The packed encoder takes text leniently, ignoring stray lines outside
    /// any section.
    pub fn read_text(self, text: &str) -> Result<SmdFile> {
        match self {
            Self::Reforged => TextReader::lenient().read(text),
            Self::Generations => TextReader::new().read(text),
        }
    }

    /// Encode a model into this variant's binary bytes
    pub fn encode(self, file: &SmdFile) -> Result<Vec<u8>> {
        self.binary_format().encode(file)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| {
                v.name().eq_ignore_ascii_case(s) || v.binary_extension().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| Error::UnknownVariant(s.to_string()))
    }
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Encode => "encode",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
