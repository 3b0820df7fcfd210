//! Model format handlers
//!
//! `smd` holds the shared block model; `text`, `smdx` and `bmd` read and
//! write it in the three on-disk encodings.

pub mod bmd;
pub mod smd;
pub mod smdx;
pub mod text;

// Re-export the block model
pub use smd::{
    Block, BlockKind, Bone, BoneState, Keyframe, Link, MaterialTable, NodesBlock, SkeletonBlock,
    SmdFile, Triangle, TrianglesBlock, Vertex, VertexAnimationBlock, VertexState,
};

// Re-export codec entry points
pub use bmd::{parse_bmd_bytes, read_bmd, serialize_bmd, write_bmd};
pub use smdx::{parse_smdx_bytes, read_smdx, serialize_smdx, write_smdx};
pub use text::{TextReader, parse_smd, read_smd, to_smd_string, write_smd};
