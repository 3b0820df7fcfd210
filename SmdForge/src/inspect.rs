//! Model summaries for the `inspect` command

use std::path::Path;

use serde::Serialize;

use crate::converter::{ModelFormat, read_model};
use crate::error::Result;
use crate::formats::smd::{Block, MaterialTable, SmdFile};

/// Counts describing one model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    /// Encoding the model was read from, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Block keywords in file order
    pub blocks: Vec<String>,
    pub bones: usize,
    pub keyframes: usize,
    pub bone_states: usize,
    pub triangles: usize,
    /// Distinct material names, first-seen order
    pub materials: Vec<String>,
    pub vertex_keyframes: usize,
    pub vertex_states: usize,
}

impl ModelSummary {
    /// Summarize a model across all of its blocks
    pub fn of(file: &SmdFile) -> Self {
        let mut summary = Self::default();
        for block in &file.blocks {
            summary.blocks.push(block.kind().keyword().to_string());
            match block {
                Block::Nodes(nodes) => summary.bones += nodes.bones.len(),
                Block::Skeleton(skeleton) => {
                    summary.keyframes += skeleton.keyframes.len();
                    summary.bone_states +=
                        skeleton.keyframes.iter().map(|k| k.states.len()).sum::<usize>();
                }
                Block::Triangles(triangles) => {
                    summary.triangles += triangles.triangles.len();
                    for name in MaterialTable::from_triangles(triangles).names() {
                        if !summary.materials.iter().any(|m| m == name) {
                            summary.materials.push(name.to_string());
                        }
                    }
                }
                Block::VertexAnimation(anim) => {
                    summary.vertex_keyframes += anim.keyframes.len();
                    summary.vertex_states +=
                        anim.keyframes.iter().map(|k| k.states.len()).sum::<usize>();
                }
            }
        }
        summary
    }

    /// Pretty JSON report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read any supported model file and summarize it
pub fn inspect_file<P: AsRef<Path>>(path: P) -> Result<ModelSummary> {
    let path = path.as_ref();
    let model = read_model(path)?;
    let mut summary = ModelSummary::of(&model);
    summary.format = ModelFormat::from_path(path).map(|f| f.extension().to_string());
    Ok(summary)
}
