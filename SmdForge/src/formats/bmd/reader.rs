//! BMD reading

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use std::fs;
use std::io::Cursor;
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};
use glam::{Vec2, Vec3};

use super::{BMD_VERSION, MAX_STRING_UNITS};
use crate::error::{Error, Result};
use crate::formats::smd::{
    Bone, BoneState, Keyframe, Link, NodesBlock, SkeletonBlock, SmdFile, Triangle,
    TrianglesBlock, Vertex,
};

/// Read a .bmd file from disk
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Codec`] if the
/// data does not follow the packed layout.
///
/// [`Error::Io`]: crate::Error::Io
/// [`Error::Codec`]: crate::Error::Codec
pub fn read_bmd<P: AsRef<Path>>(path: P) -> Result<SmdFile> {
    let data = fs::read(path)?;
    parse_bmd_bytes(&data)
}

/// Parse .bmd data from bytes
///
/// A short read anywhere fails the whole parse; no partial model is returned.
///
/// # Errors
///
/// Returns [`Error::Codec`] with the byte offset of the offending field.
///
/// [`Error::Codec`]: crate::Error::Codec
pub fn parse_bmd_bytes(data: &[u8]) -> Result<SmdFile> {
    let mut reader = PackedReader::new(data);

    let version = reader.u8("version")?;
    if version != BMD_VERSION {
        tracing::warn!("Unexpected BMD version {version}, reading as version {BMD_VERSION}");
    }

    let nodes = reader.read_nodes()?;
    let skeleton = reader.read_skeleton()?;
    let materials = reader.read_materials()?;
    let triangles = reader.read_triangles(&materials)?;

    let trailing = reader.remaining();
    if trailing > 0 {
        tracing::warn!("Ignoring {trailing} trailing bytes after triangles");
    }

    let mut file = SmdFile::new().with_block(nodes).with_block(skeleton);
    if !triangles.triangles.is_empty() {
        file.push(triangles);
    }
    Ok(file)
}

/// Big-endian field reader that reports short reads by offset
struct PackedReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> PackedReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    fn offset(&self) -> u64 {
        self.cursor.position()
    }

    fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.offset())
    }

    fn short_read(offset: u64, what: &str) -> Error {
        Error::codec_at(offset, format!("unexpected end of data reading {what}"))
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        let offset = self.offset();
        self.cursor
            .read_u8()
            .map_err(|_| Self::short_read(offset, what))
    }

    fn i16(&mut self, what: &str) -> Result<i16> {
        let offset = self.offset();
        self.cursor
            .read_i16::<BigEndian>()
            .map_err(|_| Self::short_read(offset, what))
    }

    fn f32(&mut self, what: &str) -> Result<f32> {
        let offset = self.offset();
        self.cursor
            .read_f32::<BigEndian>()
            .map_err(|_| Self::short_read(offset, what))
    }

    fn vec3(&mut self, what: &str) -> Result<Vec3> {
        Ok(Vec3::new(self.f32(what)?, self.f32(what)?, self.f32(what)?))
    }

    /// A signed 16-bit count; negative counts are rejected
    fn count(&mut self, what: &str) -> Result<usize> {
        let offset = self.offset();
        let raw = self.i16(what)?;
        usize::try_from(raw)
            .map_err(|_| Error::codec_at(offset, format!("negative {what}: {raw}")))
    }

    /// Zero-terminated UTF-16 string
    fn string(&mut self, what: &str) -> Result<String> {
        let start = self.offset();
        let mut units = Vec::new();
        loop {
            let offset = self.offset();
            let unit = self
                .cursor
                .read_u16::<BigEndian>()
                .map_err(|_| Self::short_read(offset, what))?;
            if unit == 0 {
                break;
            }
            if units.len() == MAX_STRING_UNITS {
                return Err(Error::codec_at(
                    start,
                    format!("{what} exceeds {MAX_STRING_UNITS} code units"),
                ));
            }
            units.push(unit);
        }
        String::from_utf16(&units)
            .map_err(|_| Error::codec_at(start, format!("{what} is not valid UTF-16")))
    }

    fn read_nodes(&mut self) -> Result<NodesBlock> {
        let count = self.count("node count")?;
        tracing::debug!("Reading {count} nodes");

        let mut bones = Vec::with_capacity(count);
        for _ in 0..count {
            let id = self.i16("node id")?;
            let parent = self.i16("node parent")?;
            let name = self.string("node name")?;
            bones.push(Bone { id, name, parent });
        }
        Ok(NodesBlock { bones })
    }

    fn read_skeleton(&mut self) -> Result<SkeletonBlock> {
        let count = self.count("keyframe count")?;
        tracing::debug!("Reading {count} keyframes");

        let mut keyframes = Vec::with_capacity(count);
        for time in 0..count {
            let states = self.count("bone state count")?;
            let mut keyframe = Keyframe::new(time as i32);
            keyframe.states.reserve(states);
            for _ in 0..states {
                let bone = self.i16("bone state bone")?;
                let position = self.vec3("bone state position")?;
                let rotation = self.vec3("bone state rotation")?;
                keyframe.states.push(BoneState {
                    bone,
                    position,
                    rotation,
                });
            }
            keyframes.push(keyframe);
        }
        Ok(SkeletonBlock { keyframes })
    }

    fn read_materials(&mut self) -> Result<Vec<String>> {
        let count = self.count("material count")?;
        (0..count).map(|_| self.string("material name")).collect()
    }

    fn read_triangles(&mut self, materials: &[String]) -> Result<TrianglesBlock> {
        let count = self.count("triangle count")?;
        tracing::debug!(
            "Reading {count} triangles over {} materials",
            materials.len()
        );

        let mut triangles = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = self.offset();
            let index = self.u8("material index")?;
            let material = materials.get(usize::from(index)).ok_or_else(|| {
                Error::codec_at(
                    offset,
                    format!(
                        "material index {index} out of range ({} materials)",
                        materials.len()
                    ),
                )
            })?;

            let vertices = [self.read_vertex()?, self.read_vertex()?, self.read_vertex()?];
            triangles.push(Triangle {
                material: material.clone(),
                vertices,
            });
        }
        Ok(TrianglesBlock { triangles })
    }

    fn read_vertex(&mut self) -> Result<Vertex> {
        // Carried by the layout but never meaningful; parent bone reads as 0
        self.i16("vertex header")?;
        let position = self.vec3("vertex position")?;
        let normal = self.vec3("vertex normal")?;
        let uv = Vec2::new(self.f32("vertex u")?, self.f32("vertex v")?);

        let link_count = self.u8("link count")?;
        let links = (0..link_count)
            .map(|_| {
                Ok(Link {
                    bone: self.i16("link bone")?,
                    weight: self.f32("link weight")?,
                })
            })
            .collect::<Result<_>>()?;

        Ok(Vertex {
            parent_bone: 0,
            position,
            normal,
            uv,
            links,
        })
    }
}
