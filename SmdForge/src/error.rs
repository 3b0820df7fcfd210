//! Error types for `SmdForge`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `SmdForge` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error from config files and inspect reports.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Text input that is not UTF-8.
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    // ==================== Text Errors ====================
    /// The token stream was exhausted or the text is structurally malformed.
    #[error("line {line}, column {column}: {message}{}", .token.as_deref().map(|t| format!(" (at {t:?})")).unwrap_or_default())]
    Parse {
        /// 1-based source line of the offending token (0 when the stream is empty).
        line: usize,
        /// 0-based column of the offending token.
        column: usize,
        /// Text of the offending token, if there was one.
        token: Option<String>,
        /// What went wrong.
        message: String,
    },

    /// A section or record line violates the SMD grammar.
    #[error("{section} section, line {line}: {message}")]
    Format {
        /// Section keyword (`nodes`, `skeleton`, ...) or `file` outside any section.
        section: String,
        /// 1-based source line.
        line: usize,
        /// What went wrong.
        message: String,
    },

    // ==================== Binary Errors ====================
    /// A binary layout was violated: short read, count mismatch, bad index, bad type.
    #[error("{location}: {message}")]
    Codec {
        /// Byte offset (packed) or value path (typed) where decoding stopped.
        location: String,
        /// What went wrong.
        message: String,
    },

    // ==================== Driver Errors ====================
    /// The requested conversion pair is not supported.
    #[error("unsupported conversion: {from} -> {to}")]
    UnsupportedConversion {
        /// Source extension.
        from: String,
        /// Destination extension.
        to: String,
    },

    /// A variant name that is neither `reforged` nor `generations`.
    #[error("unknown variant `{0}`, expected reforged or generations")]
    UnknownVariant(String),

    /// Reading a model archive failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDir(String),

    /// Invalid file path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Any of the above, tagged with the file being processed.
    #[error("{}: {source}", .path.display())]
    InFile {
        /// The input file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Build a codec error at a byte offset.
    pub fn codec_at(offset: u64, message: impl Into<String>) -> Self {
        Error::Codec {
            location: format!("offset {offset:#x}"),
            message: message.into(),
        }
    }

    /// Build a codec error at a value path.
    pub fn codec_in(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Codec {
            location: path.into(),
            message: message.into(),
        }
    }

    /// Attach the file identity to an error.
    #[must_use]
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            already @ Error::InFile { .. } => already,
            other => Error::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The error without any file wrapper.
    pub fn root(&self) -> &Error {
        match self {
            Error::InFile { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self.root(), Error::Parse { .. })
    }

    pub fn is_format_error(&self) -> bool {
        matches!(self.root(), Error::Format { .. })
    }

    pub fn is_codec_error(&self) -> bool {
        matches!(self.root(), Error::Codec { .. })
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDir(err.to_string())
    }
}

/// A specialized Result type for `SmdForge` operations.
pub type Result<T> = std::result::Result<T, Error>;
