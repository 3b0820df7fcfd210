//! SMDX writing

use std::fs;
use std::path::Path;

use glam::Vec3;
use rmpv::Value;

use crate::error::{Error, Result};
use crate::formats::smd::{Block, Keyframe, Link, SmdFile, Vertex};

/// Write a model to disk as SMDX
pub fn write_smdx<P: AsRef<Path>>(file: &SmdFile, path: P) -> Result<()> {
    let bytes = serialize_smdx(file)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Encode a model as SMDX bytes
///
/// Every block is written, empty ones included, in model order.
pub fn serialize_smdx(file: &SmdFile) -> Result<Vec<u8>> {
    let root = Value::Array(file.blocks.iter().map(block_value).collect());
    let mut out = Vec::new();
    rmpv::encode::write_value(&mut out, &root)
        .map_err(|e| Error::codec_in("root", e.to_string()))?;
    Ok(out)
}

fn block_value(block: &Block) -> Value {
    let records = match block {
        Block::Nodes(nodes) => nodes
            .bones
            .iter()
            .map(|bone| {
                Value::Array(vec![
                    Value::from(bone.id),
                    Value::from(bone.name.as_str()),
                    Value::from(bone.parent),
                ])
            })
            .collect(),
        Block::Skeleton(skeleton) => keyframe_values(&skeleton.keyframes, |state| {
            state_value(Value::from(state.bone), state.position, state.rotation)
        }),
        Block::VertexAnimation(animation) => keyframe_values(&animation.keyframes, |state| {
            state_value(Value::from(state.vertex), state.position, state.normal)
        }),
        Block::Triangles(triangles) => triangles
            .triangles
            .iter()
            .map(|triangle| {
                Value::Array(vec![
                    Value::from(triangle.material.as_str()),
                    Value::Array(triangle.vertices.iter().map(vertex_value).collect()),
                ])
            })
            .collect(),
    };

    Value::Array(vec![
        Value::from(block.kind().keyword()),
        Value::Array(records),
    ])
}

fn keyframe_values<S>(keyframes: &[Keyframe<S>], state: impl Fn(&S) -> Value) -> Vec<Value> {
    keyframes
        .iter()
        .map(|keyframe| {
            Value::Array(vec![
                Value::from(keyframe.time),
                Value::Array(keyframe.states.iter().map(&state).collect()),
            ])
        })
        .collect()
}

fn state_value(index: Value, a: Vec3, b: Vec3) -> Value {
    let mut fields = Vec::with_capacity(7);
    fields.push(index);
    push_vec3(&mut fields, a);
    push_vec3(&mut fields, b);
    Value::Array(fields)
}

fn vertex_value(vertex: &Vertex) -> Value {
    let mut fields = Vec::with_capacity(10);
    fields.push(Value::from(vertex.parent_bone));
    push_vec3(&mut fields, vertex.position);
    push_vec3(&mut fields, vertex.normal);
    fields.push(Value::F32(vertex.uv.x));
    fields.push(Value::F32(vertex.uv.y));
    fields.push(Value::Array(vertex.links.iter().map(link_value).collect()));
    Value::Array(fields)
}

fn link_value(link: &Link) -> Value {
    Value::Array(vec![Value::from(link.bone), Value::F32(link.weight)])
}

fn push_vec3(fields: &mut Vec<Value>, v: Vec3) {
    fields.extend([Value::F32(v.x), Value::F32(v.y), Value::F32(v.z)]);
}
