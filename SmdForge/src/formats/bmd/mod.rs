//! BMD packed-binary model format
//!
//! Fixed layout, big-endian, no padding and no type tags:
//!
//! ```text
//! u8   version
//! i16  node count      { i16 id, i16 parent, utf16z name }
//! i16  keyframe count  { i16 state count { i16 bone, f32 px py pz, f32 rx ry rz } }
//! i16  material count  { utf16z name }
//! i16  triangle count  { u8 material index, 3 x vertex }
//!
//! vertex = i16 unused, f32 px py pz, f32 nx ny nz, f32 u v,
//!          u8 link count { i16 bone, f32 weight }
//! ```
//!
//! `utf16z` is a run of big-endian UTF-16 code units ended by a zero unit.
//! Keyframe times are implicit (the keyframe's position) and the per-vertex
//! `unused` field decodes as parent bone 0. Vertex animation has no encoding.

mod reader;
mod writer;

pub use reader::{parse_bmd_bytes, read_bmd};
pub use writer::{serialize_bmd, write_bmd};

/// File extension for packed-binary models
pub const BMD_EXTENSION: &str = "bmd";

/// Version byte written by the encoder
pub const BMD_VERSION: u8 = crate::formats::smd::SMD_VERSION;

/// Longest name, in UTF-16 code units, excluding the terminator
pub const MAX_STRING_UNITS: usize = u16::MAX as usize;

/// Material indices are a single byte
pub const MAX_MATERIALS: usize = u8::MAX as usize + 1;

/// Link counts are a single byte
pub const MAX_LINKS: usize = u8::MAX as usize;
