//! SMDX reading

use std::fs;
use std::io::Cursor;
use std::path::Path;

use glam::{Vec2, Vec3};
use rmpv::Value;

use super::{
    BLOCK_FIELDS, BONE_FIELDS, KEYFRAME_FIELDS, LINK_FIELDS, STATE_FIELDS, TRIANGLE_FIELDS,
    VERTEX_FIELDS,
};
use crate::error::{Error, Result};
use crate::formats::smd::{
    Block, BlockKind, Bone, BoneState, Keyframe, Link, NodesBlock, SkeletonBlock, SmdFile,
    Triangle, TrianglesBlock, Vertex, VertexAnimationBlock, VertexState,
};

/// Read an SMDX file from disk
pub fn read_smdx<P: AsRef<Path>>(path: P) -> Result<SmdFile> {
    let data = fs::read(path)?;
    parse_smdx_bytes(&data)
}

/// Decode SMDX bytes into a model
pub fn parse_smdx_bytes(data: &[u8]) -> Result<SmdFile> {
    let mut cursor = Cursor::new(data);
    let root = rmpv::decode::read_value(&mut cursor)
        .map_err(|e| Error::codec_at(cursor.position(), format!("invalid MessagePack: {e}")))?;

    let consumed = cursor.position();
    if consumed < data.len() as u64 {
        return Err(Error::codec_at(
            consumed,
            format!("{} trailing bytes after model", data.len() as u64 - consumed),
        ));
    }

    read_file(&root)
}

// ============================================================================
// Value paths for diagnostics
// ============================================================================

#[derive(Clone, Copy)]
enum Segment<'a> {
    Root,
    Field(&'a str),
    Index(usize),
}

/// Where in the document a value sits, rendered only when reporting an error
#[derive(Clone, Copy)]
struct ValuePath<'a> {
    parent: Option<&'a ValuePath<'a>>,
    segment: Segment<'a>,
}

impl<'a> ValuePath<'a> {
    fn root() -> Self {
        Self {
            parent: None,
            segment: Segment::Root,
        }
    }

    fn field(&'a self, name: &'a str) -> ValuePath<'a> {
        ValuePath {
            parent: Some(self),
            segment: Segment::Field(name),
        }
    }

    fn index(&'a self, index: usize) -> ValuePath<'a> {
        ValuePath {
            parent: Some(self),
            segment: Segment::Index(index),
        }
    }

    fn render(&self) -> String {
        let prefix = self.parent.map(ValuePath::render).unwrap_or_default();
        match self.segment {
            Segment::Root => "root".to_string(),
            Segment::Field(name) if prefix == "root" => name.to_string(),
            Segment::Field(name) => format!("{prefix}.{name}"),
            Segment::Index(index) => format!("{prefix}[{index}]"),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::codec_in(self.render(), message)
    }
}

// ============================================================================
// Scalar and array accessors
// ============================================================================

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Boolean(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::F32(_) | Value::F64(_) => "float",
        Value::String(_) => "string",
        Value::Binary(_) => "binary",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Ext(..) => "extension",
    }
}

fn array<'v>(value: &'v Value, path: &ValuePath<'_>) -> Result<&'v [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| path.error(format!("expected array, found {}", type_name(value))))
}

fn fields<'v>(value: &'v Value, path: &ValuePath<'_>, expected: usize) -> Result<&'v [Value]> {
    let items = array(value, path)?;
    if items.len() != expected {
        return Err(path.error(format!(
            "expected {expected} fields, found {}",
            items.len()
        )));
    }
    Ok(items)
}

fn int<T: TryFrom<i64>>(value: &Value, path: &ValuePath<'_>) -> Result<T> {
    let raw = value
        .as_i64()
        .ok_or_else(|| path.error(format!("expected integer, found {}", type_name(value))))?;
    T::try_from(raw).map_err(|_| path.error(format!("integer {raw} out of range")))
}

fn float(value: &Value, path: &ValuePath<'_>) -> Result<f32> {
    match value {
        Value::F32(f) => Ok(*f),
        Value::F64(f) => Ok(*f as f32),
        Value::Integer(i) => i
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| path.error("integer is not representable as a float")),
        other => Err(path.error(format!("expected float, found {}", type_name(other)))),
    }
}

fn string<'v>(value: &'v Value, path: &ValuePath<'_>) -> Result<&'v str> {
    match value {
        Value::String(s) => s
            .as_str()
            .ok_or_else(|| path.error("string is not valid UTF-8")),
        other => Err(path.error(format!("expected string, found {}", type_name(other)))),
    }
}

fn vec3(items: &[Value], path: &ValuePath<'_>, name: &str) -> Result<Vec3> {
    let path = path.field(name);
    Ok(Vec3::new(
        float(&items[0], &path.index(0))?,
        float(&items[1], &path.index(1))?,
        float(&items[2], &path.index(2))?,
    ))
}

// ============================================================================
// Blocks
// ============================================================================

fn read_file(root: &Value) -> Result<SmdFile> {
    let path = ValuePath::root();
    let mut file = SmdFile::new();

    for (i, value) in array(root, &path)?.iter().enumerate() {
        let block_path = path.index(i);
        let block = fields(value, &block_path, BLOCK_FIELDS)?;
        let keyword = string(&block[0], &block_path.index(0))?;
        let kind = BlockKind::from_keyword(keyword)
            .ok_or_else(|| block_path.error(format!("unknown block kind `{keyword}`")))?;

        let records_path = block_path.field(kind.keyword());
        let records = array(&block[1], &records_path)?;
        tracing::debug!("Reading {} {kind} records", records.len());

        let block = match kind {
            BlockKind::Nodes => Block::Nodes(read_nodes(records, &records_path)?),
            BlockKind::Skeleton => Block::Skeleton(read_skeleton(records, &records_path)?),
            BlockKind::Triangles => Block::Triangles(read_triangles(records, &records_path)?),
            BlockKind::VertexAnimation => {
                Block::VertexAnimation(read_vertex_animation(records, &records_path)?)
            }
        };
        file.push(block);
    }

    Ok(file)
}

fn read_nodes(records: &[Value], path: &ValuePath<'_>) -> Result<NodesBlock> {
    let bones = records
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let path = path.index(i);
            let f = fields(value, &path, BONE_FIELDS)?;
            Ok(Bone {
                id: int(&f[0], &path.field("id"))?,
                name: string(&f[1], &path.field("name"))?.to_string(),
                parent: int(&f[2], &path.field("parent"))?,
            })
        })
        .collect::<Result<_>>()?;
    Ok(NodesBlock { bones })
}

/// Shared keyframe framing for skeleton and vertex animation blocks
fn read_keyframes<S>(
    records: &[Value],
    path: &ValuePath<'_>,
    read_state: impl Fn(&[Value], &ValuePath<'_>) -> Result<S>,
) -> Result<Vec<Keyframe<S>>> {
    records
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let path = path.index(i);
            let f = fields(value, &path, KEYFRAME_FIELDS)?;
            let time = int(&f[0], &path.field("time"))?;
            let states_path = path.field("states");
            let states = array(&f[1], &states_path)?
                .iter()
                .enumerate()
                .map(|(j, state)| {
                    let state_path = states_path.index(j);
                    read_state(fields(state, &state_path, STATE_FIELDS)?, &state_path)
                })
                .collect::<Result<_>>()?;
            Ok(Keyframe { time, states })
        })
        .collect()
}

fn read_skeleton(records: &[Value], path: &ValuePath<'_>) -> Result<SkeletonBlock> {
    let keyframes = read_keyframes(records, path, |f, path| {
        Ok(BoneState {
            bone: int(&f[0], &path.field("bone"))?,
            position: vec3(&f[1..4], path, "position")?,
            rotation: vec3(&f[4..7], path, "rotation")?,
        })
    })?;
    Ok(SkeletonBlock { keyframes })
}

fn read_vertex_animation(records: &[Value], path: &ValuePath<'_>) -> Result<VertexAnimationBlock> {
    let keyframes = read_keyframes(records, path, |f, path| {
        Ok(VertexState {
            vertex: int(&f[0], &path.field("vertex"))?,
            position: vec3(&f[1..4], path, "position")?,
            normal: vec3(&f[4..7], path, "normal")?,
        })
    })?;
    Ok(VertexAnimationBlock { keyframes })
}

fn read_triangles(records: &[Value], path: &ValuePath<'_>) -> Result<TrianglesBlock> {
    let triangles = records
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let path = path.index(i);
            let f = fields(value, &path, TRIANGLE_FIELDS)?;
            let material = string(&f[0], &path.field("material"))?.to_string();

            let vertices_path = path.field("vertices");
            let v = fields(&f[1], &vertices_path, 3)?;
            let vertices = [
                read_vertex(&v[0], &vertices_path.index(0))?,
                read_vertex(&v[1], &vertices_path.index(1))?,
                read_vertex(&v[2], &vertices_path.index(2))?,
            ];
            Ok(Triangle { material, vertices })
        })
        .collect::<Result<_>>()?;
    Ok(TrianglesBlock { triangles })
}

fn read_vertex(value: &Value, path: &ValuePath<'_>) -> Result<Vertex> {
    let f = fields(value, path, VERTEX_FIELDS)?;
    let uv_path = path.field("uv");

    let links_path = path.field("links");
    let links = array(&f[9], &links_path)?
        .iter()
        .enumerate()
        .map(|(i, link)| {
            let link_path = links_path.index(i);
            let pair = fields(link, &link_path, LINK_FIELDS)?;
            Ok(Link {
                bone: int(&pair[0], &link_path.field("bone"))?,
                weight: float(&pair[1], &link_path.field("weight"))?,
            })
        })
        .collect::<Result<_>>()?;

    Ok(Vertex {
        parent_bone: int(&f[0], &path.field("parent_bone"))?,
        position: vec3(&f[1..4], path, "position")?,
        normal: vec3(&f[4..7], path, "normal")?,
        uv: Vec2::new(
            float(&f[7], &uv_path.index(0))?,
            float(&f[8], &uv_path.index(1))?,
        ),
        links,
    })
}
