//! Block model types
//!
//! Bone, vertex and material references are plain indices resolved against the
//! nodes block (or the material table) at use time. Nothing here validates
//! them; readers and writers carry them through verbatim.

use glam::{Vec2, Vec3};

/// A parsed model: blocks in file order.
///
/// Block order is significant, it is the section order on write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmdFile {
    pub blocks: Vec<Block>,
}

impl SmdFile {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Append a block, keeping insertion order
    pub fn push(&mut self, block: impl Into<Block>) {
        self.blocks.push(block.into());
    }

    /// Builder-style [`SmdFile::push`]
    #[must_use]
    pub fn with_block(mut self, block: impl Into<Block>) -> Self {
        self.push(block);
        self
    }

    /// First nodes block, if any
    pub fn nodes(&self) -> Option<&NodesBlock> {
        self.blocks.iter().find_map(|b| match b {
            Block::Nodes(nodes) => Some(nodes),
            _ => None,
        })
    }

    /// First skeleton block, if any
    pub fn skeleton(&self) -> Option<&SkeletonBlock> {
        self.blocks.iter().find_map(|b| match b {
            Block::Skeleton(skeleton) => Some(skeleton),
            _ => None,
        })
    }

    /// First triangles block, if any
    pub fn triangles(&self) -> Option<&TrianglesBlock> {
        self.blocks.iter().find_map(|b| match b {
            Block::Triangles(triangles) => Some(triangles),
            _ => None,
        })
    }

    /// First vertex animation block, if any
    pub fn vertex_animation(&self) -> Option<&VertexAnimationBlock> {
        self.blocks.iter().find_map(|b| match b {
            Block::VertexAnimation(anim) => Some(anim),
            _ => None,
        })
    }

    /// Number of blocks of the given kind
    pub fn count_of(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| b.kind() == kind).count()
    }
}

/// One structural section of a model
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Nodes(NodesBlock),
    Skeleton(SkeletonBlock),
    Triangles(TrianglesBlock),
    VertexAnimation(VertexAnimationBlock),
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Nodes(_) => BlockKind::Nodes,
            Block::Skeleton(_) => BlockKind::Skeleton,
            Block::Triangles(_) => BlockKind::Triangles,
            Block::VertexAnimation(_) => BlockKind::VertexAnimation,
        }
    }

    /// Whether the block holds no records
    pub fn is_empty(&self) -> bool {
        match self {
            Block::Nodes(b) => b.bones.is_empty(),
            Block::Skeleton(b) => b.keyframes.is_empty(),
            Block::Triangles(b) => b.triangles.is_empty(),
            Block::VertexAnimation(b) => b.keyframes.is_empty(),
        }
    }
}

impl From<NodesBlock> for Block {
    fn from(block: NodesBlock) -> Self {
        Block::Nodes(block)
    }
}

impl From<SkeletonBlock> for Block {
    fn from(block: SkeletonBlock) -> Self {
        Block::Skeleton(block)
    }
}

impl From<TrianglesBlock> for Block {
    fn from(block: TrianglesBlock) -> Self {
        Block::Triangles(block)
    }
}

impl From<VertexAnimationBlock> for Block {
    fn from(block: VertexAnimationBlock) -> Self {
        Block::VertexAnimation(block)
    }
}

/// Block discriminant, named by its section keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Nodes,
    Skeleton,
    Triangles,
    VertexAnimation,
}

impl BlockKind {
    pub const ALL: [BlockKind; 4] = [
        BlockKind::Nodes,
        BlockKind::Skeleton,
        BlockKind::Triangles,
        BlockKind::VertexAnimation,
    ];

    /// Section keyword as written in text and typed-binary files
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::Skeleton => "skeleton",
            Self::Triangles => "triangles",
            Self::VertexAnimation => "vertexanimation",
        }
    }

    /// Match a section keyword, ignoring ASCII case
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(word))
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodesBlock {
    pub bones: Vec<Bone>,
}

/// A skeleton node. `parent` is -1 for a root bone.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub id: i16,
    pub name: String,
    pub parent: i16,
}

impl Bone {
    pub fn new(id: i16, name: impl Into<String>, parent: i16) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
        }
    }
}

// ============================================================================
// Keyframes
// ============================================================================

/// A time index grouping state snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe<S> {
    pub time: i32,
    pub states: Vec<S>,
}

impl<S> Keyframe<S> {
    pub fn new(time: i32) -> Self {
        Self {
            time,
            states: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_states(time: i32, states: Vec<S>) -> Self {
        Self { time, states }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletonBlock {
    pub keyframes: Vec<Keyframe<BoneState>>,
}

/// Pose of one bone in a skeleton keyframe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneState {
    pub bone: i16,
    pub position: Vec3,
    pub rotation: Vec3,
}

impl BoneState {
    pub fn new(bone: i16, position: Vec3, rotation: Vec3) -> Self {
        Self {
            bone,
            position,
            rotation,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexAnimationBlock {
    pub keyframes: Vec<Keyframe<VertexState>>,
}

/// Displacement of one vertex in a vertex animation keyframe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexState {
    pub vertex: i32,
    pub position: Vec3,
    pub normal: Vec3,
}

impl VertexState {
    pub fn new(vertex: i32, position: Vec3, normal: Vec3) -> Self {
        Self {
            vertex,
            position,
            normal,
        }
    }
}

// ============================================================================
// Triangles
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrianglesBlock {
    pub triangles: Vec<Triangle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub material: String,
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(material: impl Into<String>, vertices: [Vertex; 3]) -> Self {
        Self {
            material: material.into(),
            vertices,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub parent_bone: i16,
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub links: Vec<Link>,
}

impl Vertex {
    pub fn new(parent_bone: i16, position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            parent_bone,
            position,
            normal,
            uv,
            links: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_link(mut self, bone: i16, weight: f32) -> Self {
        self.links.push(Link { bone, weight });
        self
    }
}

/// Bone influence on a vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub bone: i16,
    pub weight: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind_keywords() {
        assert_eq!(BlockKind::from_keyword("nodes"), Some(BlockKind::Nodes));
        assert_eq!(
            BlockKind::from_keyword("VertexAnimation"),
            Some(BlockKind::VertexAnimation)
        );
        assert_eq!(BlockKind::from_keyword("end"), None);
        assert_eq!(BlockKind::Triangles.to_string(), "triangles");
    }

    #[test]
    fn test_accessors_return_first_block_of_kind() {
        let file = SmdFile::new()
            .with_block(NodesBlock {
                bones: vec![Bone::new(0, "root", -1)],
            })
            .with_block(SkeletonBlock::default())
            .with_block(NodesBlock::default());

        assert_eq!(file.nodes().map(|n| n.bones.len()), Some(1));
        assert!(file.skeleton().is_some());
        assert!(file.triangles().is_none());
        assert_eq!(file.count_of(BlockKind::Nodes), 2);
        assert!(file.blocks[1].is_empty());
    }
}
