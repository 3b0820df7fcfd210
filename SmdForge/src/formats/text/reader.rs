//! SMD text reading
//!
//! Sections open with a keyword line (`nodes`, `skeleton`, `triangles`,
//! `vertexanimation`) and close with `end`. Record lines inside a section
//! follow a fixed column grammar per section.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use glam::{Vec2, Vec3};
use lazy_static::lazy_static;
use regex::Regex;

use super::tokenizer::{Line, Token, Tokenizer};
use crate::error::{Error, Result};
use crate::formats::smd::{
    Block, BlockKind, Bone, BoneState, Keyframe, Link, NodesBlock, SkeletonBlock, SmdFile,
    Triangle, TrianglesBlock, Vertex, VertexAnimationBlock, VertexState,
};

lazy_static! {
    // id "name" parent, tolerating \" inside the name
    static ref NODE_LINE: Regex =
        Regex::new(r#"^(-?\d+)\s+"((?:\\"|.)*?)"\s+(-?\d+)$"#).expect("valid regex");
}

/// Label used for errors raised outside any section
const OUTSIDE_SECTION: &str = "file";

/// Read an SMD text file from disk
pub fn read_smd<P: AsRef<Path>>(path: P) -> Result<SmdFile> {
    let text = fs::read_to_string(path)?;
    parse_smd(&text)
}

/// Parse SMD text with the strict reader
pub fn parse_smd(text: &str) -> Result<SmdFile> {
    TextReader::new().read(text)
}

/// Builds a [`SmdFile`] from SMD text
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReader {
    lenient: bool,
}

impl TextReader {
    /// Strict reader: any line outside a section other than `version` is an error
    pub fn new() -> Self {
        Self { lenient: false }
    }

    /// Reader that skips lines outside any open section
    pub fn lenient() -> Self {
        Self { lenient: true }
    }

    pub fn read(&self, text: &str) -> Result<SmdFile> {
        let mut tokens = Tokenizer::new(text);
        let mut file = SmdFile::new();

        loop {
            let action = {
                let Some(line) = tokens.next_line() else {
                    break;
                };
                self.classify(&line)?
            };

            match action {
                TopLevel::Skip => {}
                TopLevel::Section(kind, line) => {
                    tracing::debug!("Reading {kind} section at line {line}");
                    let block = read_section(&mut tokens, kind, line)?;
                    file.push(block);
                }
            }
        }

        Ok(file)
    }

    fn classify(&self, line: &Line<'_>) -> Result<TopLevel> {
        let Some(first) = line.words.first() else {
            return Ok(TopLevel::Skip);
        };

        if line.words.len() == 1 {
            if let Some(kind) = BlockKind::from_keyword(&first.text) {
                return Ok(TopLevel::Section(kind, line.number()));
            }
        }

        if first.is_keyword("version") && line.words.len() == 2 {
            let version: i32 = parse_field(&line.words[1], OUTSIDE_SECTION, "version")?;
            tracing::debug!("SMD version {version}");
            return Ok(TopLevel::Skip);
        }

        if self.lenient {
            tracing::debug!("Ignoring line {} outside any section", line.number());
            return Ok(TopLevel::Skip);
        }

        Err(format_error(
            OUTSIDE_SECTION,
            line.number(),
            format!("unexpected `{}` outside any section", line.text()),
        ))
    }
}

enum TopLevel {
    Skip,
    Section(BlockKind, usize),
}

fn format_error(section: impl Into<String>, line: usize, message: impl Into<String>) -> Error {
    Error::Format {
        section: section.into(),
        line,
        message: message.into(),
    }
}

fn parse_field<T: FromStr>(token: &Token, section: &str, what: &str) -> Result<T> {
    token.text.parse().map_err(|_| {
        format_error(section, token.line, format!("invalid {what} `{}`", token.text))
    })
}

fn parse_vec3(words: &[Token], section: &str, what: &str) -> Result<Vec3> {
    Ok(Vec3::new(
        parse_field(&words[0], section, what)?,
        parse_field(&words[1], section, what)?,
        parse_field(&words[2], section, what)?,
    ))
}

fn expect_fields(line: &Line<'_>, section: BlockKind, expected: usize) -> Result<()> {
    if line.words.len() == expected {
        Ok(())
    } else {
        Err(format_error(
            section.keyword(),
            line.number(),
            format!("expected {expected} fields, found {}", line.words.len()),
        ))
    }
}

/// Feed every record line of a section to `on_line` until `end`
///
/// Blank lines are dropped unless `keep_blank` is set.
fn for_each_record<F>(
    tokens: &mut Tokenizer,
    kind: BlockKind,
    start: usize,
    keep_blank: bool,
    mut on_line: F,
) -> Result<()>
where
    F: FnMut(&Line<'_>) -> Result<()>,
{
    while let Some(line) = tokens.next_line() {
        if line.is_blank() && !keep_blank {
            continue;
        }
        if line.is_keyword("end") {
            return Ok(());
        }
        on_line(&line)?;
    }

    Err(format_error(
        kind.keyword(),
        start,
        "section is missing its `end` terminator",
    ))
}

fn read_section(tokens: &mut Tokenizer, kind: BlockKind, start: usize) -> Result<Block> {
    match kind {
        BlockKind::Nodes => read_nodes(tokens, start).map(Block::Nodes),
        BlockKind::Skeleton => read_skeleton(tokens, start).map(Block::Skeleton),
        BlockKind::Triangles => read_triangles(tokens, start).map(Block::Triangles),
        BlockKind::VertexAnimation => {
            read_vertex_animation(tokens, start).map(Block::VertexAnimation)
        }
    }
}

fn read_nodes(tokens: &mut Tokenizer, start: usize) -> Result<NodesBlock> {
    let section = BlockKind::Nodes.keyword();
    let mut block = NodesBlock::default();

    for_each_record(tokens, BlockKind::Nodes, start, false, |line| {
        let text = line.text();
        let caps = NODE_LINE.captures(&text).ok_or_else(|| {
            format_error(section, line.number(), format!("malformed node `{text}`"))
        })?;

        let parse_int = |value: &str, what: &str| -> Result<i16> {
            value.parse().map_err(|_| {
                format_error(section, line.number(), format!("invalid {what} `{value}`"))
            })
        };

        block.bones.push(Bone {
            id: parse_int(&caps[1], "bone id")?,
            name: caps[2].replace("\\\"", "\""),
            parent: parse_int(&caps[3], "parent id")?,
        });
        Ok(())
    })?;

    Ok(block)
}

/// Parse a `time N` line, if this is one
fn keyframe_time(line: &Line<'_>, kind: BlockKind) -> Result<Option<i32>> {
    match line.words {
        [keyword, time] if keyword.is_keyword("time") => {
            parse_field(time, kind.keyword(), "time").map(Some)
        }
        _ => Ok(None),
    }
}

fn read_skeleton(tokens: &mut Tokenizer, start: usize) -> Result<SkeletonBlock> {
    let kind = BlockKind::Skeleton;
    let section = kind.keyword();
    let mut block = SkeletonBlock::default();

    for_each_record(tokens, kind, start, false, |line| {
        if let Some(time) = keyframe_time(line, kind)? {
            block.keyframes.push(Keyframe::new(time));
            return Ok(());
        }

        let Some(keyframe) = block.keyframes.last_mut() else {
            return Err(format_error(
                section,
                line.number(),
                "bone state before the first `time` line",
            ));
        };

        expect_fields(line, kind, 7)?;
        let w = line.words;
        keyframe.states.push(BoneState {
            bone: parse_field(&w[0], section, "bone index")?,
            position: parse_vec3(&w[1..4], section, "position")?,
            rotation: parse_vec3(&w[4..7], section, "rotation")?,
        });
        Ok(())
    })?;

    Ok(block)
}

fn read_vertex_animation(tokens: &mut Tokenizer, start: usize) -> Result<VertexAnimationBlock> {
    let kind = BlockKind::VertexAnimation;
    let section = kind.keyword();
    let mut block = VertexAnimationBlock::default();

    for_each_record(tokens, kind, start, false, |line| {
        if let Some(time) = keyframe_time(line, kind)? {
            block.keyframes.push(Keyframe::new(time));
            return Ok(());
        }

        let Some(keyframe) = block.keyframes.last_mut() else {
            return Err(format_error(
                section,
                line.number(),
                "vertex state before the first `time` line",
            ));
        };

        expect_fields(line, kind, 7)?;
        let w = line.words;
        keyframe.states.push(VertexState {
            vertex: parse_field(&w[0], section, "vertex index")?,
            position: parse_vec3(&w[1..4], section, "position")?,
            normal: parse_vec3(&w[4..7], section, "normal")?,
        });
        Ok(())
    })?;

    Ok(block)
}

/// A triangle whose vertex lines are still being read
struct PendingTriangle {
    material: String,
    line: usize,
    vertices: Vec<Vertex>,
}

impl PendingTriangle {
    /// Opened by a blank line and nothing read since
    fn is_unnamed_start(&self) -> bool {
        self.material.is_empty() && self.vertices.is_empty()
    }
}

/// An empty material name is written as a blank line, so a blank line
/// between triangles opens a triangle with no material. Blank lines that are
/// followed by a material line or by `end` are dropped.
fn read_triangles(tokens: &mut Tokenizer, start: usize) -> Result<TrianglesBlock> {
    let kind = BlockKind::Triangles;
    let section = kind.keyword();
    let mut block = TrianglesBlock::default();
    let mut pending: Option<PendingTriangle> = None;

    for_each_record(tokens, kind, start, true, |line| {
        let opens_triangle = match &pending {
            None => true,
            Some(triangle) => {
                triangle.is_unnamed_start() && !line.is_blank() && line.words.len() < 9
            }
        };
        if opens_triangle {
            pending = Some(PendingTriangle {
                material: line.text(),
                line: line.number(),
                vertices: Vec::with_capacity(3),
            });
            return Ok(());
        }
        if line.is_blank() {
            return Ok(());
        }

        let Some(mut triangle) = pending.take() else {
            return Ok(());
        };
        triangle.vertices.push(parse_vertex(line)?);
        match <[Vertex; 3]>::try_from(triangle.vertices) {
            Ok(vertices) => block.triangles.push(Triangle {
                material: triangle.material,
                vertices,
            }),
            Err(vertices) => {
                pending = Some(PendingTriangle {
                    vertices,
                    ..triangle
                });
            }
        }
        Ok(())
    })?;

    if let Some(triangle) = pending.filter(|t| !t.is_unnamed_start()) {
        return Err(format_error(
            section,
            triangle.line,
            format!(
                "triangle `{}` has {} of 3 vertices",
                triangle.material,
                triangle.vertices.len()
            ),
        ));
    }

    Ok(block)
}

/// `parentBone px py pz nx ny nz u v [linkCount [bone weight]*]`
fn parse_vertex(line: &Line<'_>) -> Result<Vertex> {
    let section = BlockKind::Triangles.keyword();
    let w = line.words;
    if w.len() < 9 {
        return Err(format_error(
            section,
            line.number(),
            format!("expected at least 9 vertex fields, found {}", w.len()),
        ));
    }

    let mut vertex = Vertex::new(
        parse_field(&w[0], section, "parent bone")?,
        parse_vec3(&w[1..4], section, "position")?,
        parse_vec3(&w[4..7], section, "normal")?,
        Vec2::new(
            parse_field(&w[7], section, "uv")?,
            parse_field(&w[8], section, "uv")?,
        ),
    );

    let Some(count_token) = w.get(9) else {
        return Ok(vertex);
    };
    let count: usize = parse_field(count_token, section, "link count")?;
    let link_words = &w[10..];
    let Some(needed) = count.checked_mul(2) else {
        return Err(format_error(
            section,
            line.number(),
            format!("link count {count} is out of range"),
        ));
    };
    if link_words.len() != needed {
        return Err(format_error(
            section,
            line.number(),
            format!(
                "link count {count} needs {needed} fields, found {}",
                link_words.len()
            ),
        ));
    }

    for pair in link_words.chunks_exact(2) {
        vertex.links.push(Link {
            bone: parse_field(&pair[0], section, "link bone")?,
            weight: parse_field(&pair[1], section, "link weight")?,
        });
    }

    Ok(vertex)
}
