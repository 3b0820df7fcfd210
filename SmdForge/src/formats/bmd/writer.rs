//! BMD writing

#![allow(clippy::cast_possible_truncation)]

use std::fs;
use std::path::Path;

use byteorder::{BigEndian, WriteBytesExt};
use glam::Vec3;

use super::{BMD_VERSION, MAX_LINKS, MAX_MATERIALS, MAX_STRING_UNITS};
use crate::error::{Error, Result};
use crate::formats::smd::{
    BlockKind, MaterialTable, NodesBlock, SkeletonBlock, SmdFile, TrianglesBlock, Vertex,
};

/// Write a model to disk as .bmd
///
/// # Errors
///
/// Returns [`Error::Codec`] if the model cannot be packed and [`Error::Io`]
/// if the file cannot be written.
///
/// [`Error::Codec`]: crate::Error::Codec
/// [`Error::Io`]: crate::Error::Io
pub fn write_bmd<P: AsRef<Path>>(file: &SmdFile, path: P) -> Result<()> {
    let bytes = serialize_bmd(file)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Encode a model as .bmd bytes
///
/// The material table is rebuilt from triangle order. Missing blocks are
/// written as empty sections.
///
/// # Errors
///
/// Returns [`Error::Codec`] when the model holds more than one block of a
/// kind, a non-empty vertex animation, or a count or name the layout cannot
/// represent.
///
/// [`Error::Codec`]: crate::Error::Codec
pub fn serialize_bmd(file: &SmdFile) -> Result<Vec<u8>> {
    for kind in BlockKind::ALL {
        if file.count_of(kind) > 1 {
            return Err(Error::codec_in(
                kind.keyword(),
                format!("packed models hold one {kind} block, found {}", file.count_of(kind)),
            ));
        }
    }
    if file.vertex_animation().is_some_and(|anim| !anim.keyframes.is_empty()) {
        return Err(Error::codec_in(
            "vertexanimation",
            "vertex animation cannot be stored in a packed model",
        ));
    }

    let mut out = Vec::new();
    out.write_u8(BMD_VERSION)?;

    let empty_nodes = NodesBlock::default();
    let empty_skeleton = SkeletonBlock::default();
    let empty_triangles = TrianglesBlock::default();
    write_nodes(&mut out, file.nodes().unwrap_or(&empty_nodes))?;
    write_skeleton(&mut out, file.skeleton().unwrap_or(&empty_skeleton))?;
    write_triangles(&mut out, file.triangles().unwrap_or(&empty_triangles))?;

    tracing::debug!("Packed model into {} bytes", out.len());
    Ok(out)
}

fn count(len: usize, location: impl FnOnce() -> String) -> Result<i16> {
    i16::try_from(len).map_err(|_| {
        Error::codec_in(
            location(),
            format!("{len} entries exceed the limit of {}", i16::MAX),
        )
    })
}

fn write_string(out: &mut Vec<u8>, text: &str, location: impl FnOnce() -> String) -> Result<()> {
    if text.contains('\0') {
        return Err(Error::codec_in(location(), "name contains a NUL character"));
    }
    let units: Vec<u16> = text.encode_utf16().collect();
    if units.len() > MAX_STRING_UNITS {
        return Err(Error::codec_in(
            location(),
            format!("name is {} code units, limit is {MAX_STRING_UNITS}", units.len()),
        ));
    }
    for unit in units {
        out.write_u16::<BigEndian>(unit)?;
    }
    out.write_u16::<BigEndian>(0)?;
    Ok(())
}

fn write_vec3(out: &mut Vec<u8>, v: Vec3) -> Result<()> {
    out.write_f32::<BigEndian>(v.x)?;
    out.write_f32::<BigEndian>(v.y)?;
    out.write_f32::<BigEndian>(v.z)?;
    Ok(())
}

fn write_nodes(out: &mut Vec<u8>, nodes: &NodesBlock) -> Result<()> {
    out.write_i16::<BigEndian>(count(nodes.bones.len(), || "nodes".into())?)?;
    for (i, bone) in nodes.bones.iter().enumerate() {
        out.write_i16::<BigEndian>(bone.id)?;
        out.write_i16::<BigEndian>(bone.parent)?;
        write_string(out, &bone.name, || format!("nodes[{i}].name"))?;
    }
    Ok(())
}

fn write_skeleton(out: &mut Vec<u8>, skeleton: &SkeletonBlock) -> Result<()> {
    let keyframes = &skeleton.keyframes;
    out.write_i16::<BigEndian>(count(keyframes.len(), || "skeleton".into())?)?;

    let sequential = keyframes
        .iter()
        .enumerate()
        .all(|(i, k)| usize::try_from(k.time).is_ok_and(|t| t == i));
    if !sequential {
        tracing::warn!(
            "Keyframe times are not 0..{}; packed keyframes are renumbered by position",
            keyframes.len()
        );
    }

    for (i, keyframe) in keyframes.iter().enumerate() {
        out.write_i16::<BigEndian>(count(keyframe.states.len(), || {
            format!("skeleton[{i}].states")
        })?)?;
        for state in &keyframe.states {
            out.write_i16::<BigEndian>(state.bone)?;
            write_vec3(out, state.position)?;
            write_vec3(out, state.rotation)?;
        }
    }
    Ok(())
}

fn write_triangles(out: &mut Vec<u8>, triangles: &TrianglesBlock) -> Result<()> {
    let table = MaterialTable::from_triangles(triangles);
    if table.len() > MAX_MATERIALS {
        return Err(Error::codec_in(
            "triangles",
            format!("{} materials, limit is {MAX_MATERIALS}", table.len()),
        ));
    }

    out.write_i16::<BigEndian>(count(table.len(), || "materials".into())?)?;
    for (i, name) in table.names().enumerate() {
        write_string(out, name, || format!("materials[{i}]"))?;
    }

    out.write_i16::<BigEndian>(count(triangles.triangles.len(), || "triangles".into())?)?;
    for (i, (triangle, &material)) in triangles
        .triangles
        .iter()
        .zip(table.indices())
        .enumerate()
    {
        out.write_u8(material as u8)?;
        for (j, vertex) in triangle.vertices.iter().enumerate() {
            write_vertex(out, vertex, || format!("triangles[{i}].vertices[{j}]"))?;
        }
    }
    Ok(())
}

fn write_vertex(
    out: &mut Vec<u8>,
    vertex: &Vertex,
    location: impl FnOnce() -> String,
) -> Result<()> {
    if vertex.links.len() > MAX_LINKS {
        return Err(Error::codec_in(
            location(),
            format!("{} links, limit is {MAX_LINKS}", vertex.links.len()),
        ));
    }

    out.write_i16::<BigEndian>(vertex.parent_bone)?;
    write_vec3(out, vertex.position)?;
    write_vec3(out, vertex.normal)?;
    out.write_f32::<BigEndian>(vertex.uv.x)?;
    out.write_f32::<BigEndian>(vertex.uv.y)?;
    out.write_u8(vertex.links.len() as u8)?;
    for link in &vertex.links {
        out.write_i16::<BigEndian>(link.bone)?;
        out.write_f32::<BigEndian>(link.weight)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::bmd::parse_bmd_bytes;
    use crate::formats::smd::{
        Bone, Keyframe, Triangle, VertexAnimationBlock, VertexState,
    };
    use glam::Vec2;

    fn triangle(material: &str) -> Triangle {
        let v = Vertex::new(0, Vec3::ZERO, Vec3::Z, Vec2::ZERO);
        Triangle::new(material, [v.clone(), v.clone(), v])
    }

    fn packed_triangles(materials: &[&str]) -> Vec<u8> {
        let file = SmdFile::new().with_block(TrianglesBlock {
            triangles: materials.iter().map(|m| triangle(m)).collect(),
        });
        serialize_bmd(&file).unwrap()
    }

    #[test]
    fn test_material_table_and_indices() {
        let bytes = packed_triangles(&["A", "B", "A", "C"]);

        // version, empty nodes, empty skeleton
        let mut pos = 5;
        assert_eq!(&bytes[pos..pos + 2], &3i16.to_be_bytes());
        pos += 2;
        for name in ["A", "B", "C"] {
            assert_eq!(&bytes[pos..pos + 4], &[0, name.as_bytes()[0], 0, 0]);
            pos += 4;
        }
        assert_eq!(&bytes[pos..pos + 2], &4i16.to_be_bytes());
        pos += 2;

        // material byte, then 3 vertices of 2 + 32 + 1 bytes each
        let mut indices = Vec::new();
        for _ in 0..4 {
            indices.push(bytes[pos]);
            pos += 1 + 3 * 35;
        }
        assert_eq!(indices, vec![0, 1, 0, 2]);
        assert_eq!(pos, bytes.len());
    }

    #[test]
    fn test_decoded_materials_follow_triangles() {
        let bytes = packed_triangles(&["A", "B", "A", "C"]);
        let file = parse_bmd_bytes(&bytes).unwrap();
        let materials: Vec<&str> = file
            .triangles()
            .unwrap()
            .triangles
            .iter()
            .map(|t| t.material.as_str())
            .collect();
        assert_eq!(materials, vec!["A", "B", "A", "C"]);
    }

    #[test]
    fn test_embedded_nul_rejected() {
        let file = SmdFile::new().with_block(NodesBlock {
            bones: vec![Bone::new(0, "a\0b", -1)],
        });
        let err = serialize_bmd(&file).unwrap_err();
        assert_eq!(err.to_string(), "nodes[0].name: name contains a NUL character");
    }

    #[test]
    fn test_too_many_materials() {
        let names: Vec<String> = (0..=MAX_MATERIALS).map(|i| format!("m{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let file = SmdFile::new().with_block(TrianglesBlock {
            triangles: refs.iter().map(|m| triangle(m)).collect(),
        });
        assert!(serialize_bmd(&file).unwrap_err().is_codec_error());

        let bytes = packed_triangles(&refs[..MAX_MATERIALS]);
        assert!(parse_bmd_bytes(&bytes).is_ok());
    }

    #[test]
    fn test_vertex_animation_rejected() {
        let file = SmdFile::new()
            .with_block(NodesBlock::default())
            .with_block(VertexAnimationBlock {
                keyframes: vec![Keyframe::with_states(
                    0,
                    vec![VertexState::new(0, Vec3::ZERO, Vec3::Z)],
                )],
            });
        assert!(serialize_bmd(&file).unwrap_err().is_codec_error());

        let empty = SmdFile::new().with_block(VertexAnimationBlock::default());
        assert!(serialize_bmd(&empty).is_ok());
    }

    #[test]
    fn test_duplicate_block_rejected() {
        let file = SmdFile::new()
            .with_block(NodesBlock::default())
            .with_block(NodesBlock::default());
        let err = serialize_bmd(&file).unwrap_err();
        assert_eq!(err.to_string(), "nodes: packed models hold one nodes block, found 2");
    }

    #[test]
    fn test_renumbered_keyframes() {
        let file = SmdFile::new().with_block(SkeletonBlock {
            keyframes: vec![Keyframe::new(5), Keyframe::new(9)],
        });
        let decoded = parse_bmd_bytes(&serialize_bmd(&file).unwrap()).unwrap();
        let times: Vec<i32> = decoded
            .skeleton()
            .unwrap()
            .keyframes
            .iter()
            .map(|k| k.time)
            .collect();
        assert_eq!(times, vec![0, 1]);
    }
}
