//! Utility functions

pub mod path;

pub use path::{expand_tilde, extension_of, normalize_path, with_extension};
