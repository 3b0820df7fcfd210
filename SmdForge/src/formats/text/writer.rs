//! SMD text writing
//!
//! Floats are written fixed-point with six decimals (`{:.6}`), which is
//! locale independent. A bone or vertex state whose six components are all
//! exactly zero is written as integer zeros (`0 0 0  0 0 0`) instead;
//! downstream tools depend on that asymmetry.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use glam::Vec3;

use crate::error::Result;
use crate::formats::smd::{
    Block, NodesBlock, SkeletonBlock, SMD_VERSION, SmdFile, TrianglesBlock, Vertex,
    VertexAnimationBlock,
};

/// Write a model to disk as SMD text
pub fn write_smd<P: AsRef<Path>>(file: &SmdFile, path: P) -> Result<()> {
    fs::write(path, to_smd_string(file))?;
    Ok(())
}

/// Serialize a model to SMD text
///
/// Blocks are written in model order rather than a fixed section order, so a
/// parsed file writes back with its sections where they were. Models built
/// in the usual `nodes, skeleton, triangles, vertexanimation` order come out
/// in that order. Empty triangles and vertex animation blocks produce no
/// section at all.
pub fn to_smd_string(file: &SmdFile) -> String {
    let mut out = String::new();
    write_file(&mut out, file).expect("formatting into a String cannot fail");
    out
}

fn write_file(out: &mut String, file: &SmdFile) -> fmt::Result {
    writeln!(out, "version {SMD_VERSION}")?;
    for block in &file.blocks {
        match block {
            Block::Nodes(nodes) => write_nodes(out, nodes)?,
            Block::Skeleton(skeleton) => write_skeleton(out, skeleton)?,
            Block::Triangles(triangles) if !triangles.triangles.is_empty() => {
                write_triangles(out, triangles)?;
            }
            Block::VertexAnimation(anim) if !anim.keyframes.is_empty() => {
                write_vertex_animation(out, anim)?;
            }
            Block::Triangles(_) | Block::VertexAnimation(_) => {}
        }
    }
    Ok(())
}

fn write_nodes(out: &mut String, nodes: &NodesBlock) -> fmt::Result {
    writeln!(out, "nodes")?;
    for bone in &nodes.bones {
        let name = bone.name.replace('"', "\\\"");
        writeln!(out, "{} \"{name}\" {}", bone.id, bone.parent)?;
    }
    writeln!(out, "end")
}

fn write_skeleton(out: &mut String, skeleton: &SkeletonBlock) -> fmt::Result {
    writeln!(out, "skeleton")?;
    for keyframe in &skeleton.keyframes {
        writeln!(out, "time {}", keyframe.time)?;
        for state in &keyframe.states {
            write_state(out, state.bone, state.position, state.rotation)?;
        }
    }
    writeln!(out, "end")
}

fn write_triangles(out: &mut String, triangles: &TrianglesBlock) -> fmt::Result {
    writeln!(out, "triangles")?;
    for triangle in &triangles.triangles {
        writeln!(out, "{}", triangle.material)?;
        for vertex in &triangle.vertices {
            write_vertex(out, vertex)?;
        }
    }
    writeln!(out, "end")
}

fn write_vertex_animation(out: &mut String, anim: &VertexAnimationBlock) -> fmt::Result {
    writeln!(out, "vertexanimation")?;
    for keyframe in &anim.keyframes {
        writeln!(out, "time {}", keyframe.time)?;
        for state in &keyframe.states {
            write_state(out, state.vertex, state.position, state.normal)?;
        }
    }
    writeln!(out, "end")
}

/// `index  a.x a.y a.z  b.x b.y b.z`, integer zeros when all six are zero
fn write_state(out: &mut String, index: impl fmt::Display, a: Vec3, b: Vec3) -> fmt::Result {
    if a == Vec3::ZERO && b == Vec3::ZERO {
        writeln!(out, "{index}  0 0 0  0 0 0")
    } else {
        writeln!(
            out,
            "{index}  {:.6} {:.6} {:.6}  {:.6} {:.6} {:.6}",
            a.x, a.y, a.z, b.x, b.y, b.z
        )
    }
}

fn write_vertex(out: &mut String, v: &Vertex) -> fmt::Result {
    write!(
        out,
        "{}  {:.6} {:.6} {:.6}  {:.6} {:.6} {:.6}  {:.6} {:.6} {}",
        v.parent_bone,
        v.position.x,
        v.position.y,
        v.position.z,
        v.normal.x,
        v.normal.y,
        v.normal.z,
        v.uv.x,
        v.uv.y,
        v.links.len()
    )?;
    for link in &v.links {
        write!(out, " {} {:.6}", link.bone, link.weight)?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::smd::{Bone, BoneState, Keyframe, Triangle, VertexState};
    use glam::Vec2;

    #[test]
    fn test_zero_state_uses_integer_zeros() {
        let file = SmdFile::new().with_block(SkeletonBlock {
            keyframes: vec![Keyframe::with_states(
                0,
                vec![
                    BoneState::new(0, Vec3::ZERO, Vec3::ZERO),
                    BoneState::new(1, Vec3::ZERO, Vec3::new(0.0, 0.0, 0.5)),
                    BoneState::new(2, Vec3::new(-0.0, 0.0, 0.0), Vec3::ZERO),
                ],
            )],
        });
        let text = to_smd_string(&file);
        assert_eq!(
            text,
            "version 1\nskeleton\ntime 0\n\
             0  0 0 0  0 0 0\n\
             1  0.000000 0.000000 0.000000  0.000000 0.000000 0.500000\n\
             2  0 0 0  0 0 0\n\
             end\n"
        );
    }

    #[test]
    fn test_vertex_animation_states() {
        let file = SmdFile::new().with_block(VertexAnimationBlock {
            keyframes: vec![Keyframe::with_states(
                3,
                vec![VertexState::new(7, Vec3::X, Vec3::ZERO)],
            )],
        });
        let text = to_smd_string(&file);
        assert!(text.contains("vertexanimation\ntime 3\n7  1.000000 0.000000 0.000000  0.000000 0.000000 0.000000\nend\n"));
    }

    #[test]
    fn test_nodes_and_triangle_lines() {
        let vertex = Vertex::new(0, Vec3::new(1.0, 2.0, 3.0), Vec3::Z, Vec2::new(0.5, 1.0))
            .with_link(4, 0.75);
        let file = SmdFile::new()
            .with_block(NodesBlock {
                bones: vec![Bone::new(0, "root", -1), Bone::new(1, "say \"hi\"", 0)],
            })
            .with_block(TrianglesBlock {
                triangles: vec![Triangle::new(
                    "skin.png",
                    [vertex.clone(), vertex.clone(), vertex],
                )],
            });
        let text = to_smd_string(&file);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "nodes");
        assert_eq!(lines[2], "0 \"root\" -1");
        assert_eq!(lines[3], "1 \"say \\\"hi\\\"\" 0");
        assert_eq!(lines[5], "triangles");
        assert_eq!(lines[6], "skin.png");
        assert_eq!(
            lines[7],
            "0  1.000000 2.000000 3.000000  0.000000 0.000000 1.000000  0.500000 1.000000 1 4 0.750000"
        );
        assert_eq!(lines.last(), Some(&"end"));
    }

    #[test]
    fn test_sections_follow_model_order() {
        let file = SmdFile::new()
            .with_block(SkeletonBlock {
                keyframes: vec![Keyframe::new(0)],
            })
            .with_block(NodesBlock {
                bones: vec![Bone::new(0, "root", -1)],
            });

        assert_eq!(
            to_smd_string(&file),
            "version 1\nskeleton\ntime 0\nend\nnodes\n0 \"root\" -1\nend\n"
        );
    }

    #[test]
    fn test_empty_optional_sections_are_skipped() {
        let file = SmdFile::new()
            .with_block(NodesBlock::default())
            .with_block(SkeletonBlock::default())
            .with_block(TrianglesBlock::default())
            .with_block(VertexAnimationBlock::default());
        assert_eq!(
            to_smd_string(&file),
            "version 1\nnodes\nend\nskeleton\nend\n"
        );
    }
}
