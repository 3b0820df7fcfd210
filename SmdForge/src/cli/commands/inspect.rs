//! CLI interface for model inspection

use std::path::Path;

use crate::cli::progress::CUBE;
use crate::inspect::inspect_file;

pub fn execute(path: &Path, json: bool) -> anyhow::Result<()> {
    let summary = inspect_file(path)?;

    if json {
        println!("{}", summary.to_json()?);
        return Ok(());
    }

    println!("{CUBE}{}", path.display());
    if let Some(format) = &summary.format {
        println!("  Format: {format}");
    }
    println!("  Blocks: {}", summary.blocks.join(", "));
    println!("  Bones: {}", summary.bones);
    println!(
        "  Keyframes: {} ({} bone states)",
        summary.keyframes, summary.bone_states
    );
    println!("  Triangles: {}", summary.triangles);
    println!("  Materials: {}", summary.materials.len());
    for material in &summary.materials {
        println!("    {material}");
    }
    if summary.vertex_keyframes > 0 {
        println!(
            "  Vertex keyframes: {} ({} vertex states)",
            summary.vertex_keyframes, summary.vertex_states
        );
    }

    Ok(())
}
