//! SMDX typed-binary model format
//!
//! A MessagePack document whose own framing carries every type and length,
//! so no external index is needed. Layout:
//!
//! ```text
//! root          = [block*]
//! block         = [keyword, [record*]]      keyword: "nodes" | "skeleton" | "triangles" | "vertexanimation"
//! bone          = [id, name, parent]
//! keyframe      = [time, [state*]]
//! bone state    = [bone, px, py, pz, rx, ry, rz]
//! vertex state  = [vertex, px, py, pz, nx, ny, nz]
//! triangle      = [material, [vertex, vertex, vertex]]
//! vertex        = [parentBone, px, py, pz, nx, ny, nz, u, v, [link*]]
//! link          = [bone, weight]
//! ```
//!
//! Floats are written as float32. The reader also accepts float64 and
//! integers where a float is expected, and any integer width that fits.

mod reader;
mod writer;

pub use reader::{parse_smdx_bytes, read_smdx};
pub use writer::{serialize_smdx, write_smdx};

/// File extension for typed-binary models
pub const SMDX_EXTENSION: &str = "smdx";

const BLOCK_FIELDS: usize = 2;
const BONE_FIELDS: usize = 3;
const KEYFRAME_FIELDS: usize = 2;
const STATE_FIELDS: usize = 7;
const TRIANGLE_FIELDS: usize = 2;
const VERTEX_FIELDS: usize = 10;
const LINK_FIELDS: usize = 2;
