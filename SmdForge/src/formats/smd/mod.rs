//! StudioMDL block model
//!
//! The in-memory form of a model asset, shared by every reader and writer.
//! A model is built fresh per input file by exactly one reader and consumed
//! by exactly one writer.

mod materials;
mod model;

pub use materials::MaterialTable;
pub use model::{
    Block, BlockKind, Bone, BoneState, Keyframe, Link, NodesBlock, SkeletonBlock, SmdFile,
    Triangle, TrianglesBlock, Vertex, VertexAnimationBlock, VertexState,
};

/// SMD format version written to text and packed output
pub const SMD_VERSION: u8 = 1;
