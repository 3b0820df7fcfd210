//! SMD text format
//!
//! The human-readable StudioMDL representation. Both binary codecs convert
//! through this form: binary -> model -> text, or text -> model -> binary.

mod reader;
mod tokenizer;
mod writer;

pub use reader::{TextReader, parse_smd, read_smd};
pub use tokenizer::{Line, Token, TokenKind, Tokenizer};
pub use writer::{to_smd_string, write_smd};
