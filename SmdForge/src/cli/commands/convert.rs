//! CLI interface for single-file conversion

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::print_done;
use crate::converter::{ModelFormat, convert_file};

pub fn execute(source: &Path, destination: &Path) -> anyhow::Result<()> {
    let start = Instant::now();

    let from = ModelFormat::from_path(source).ok_or_else(|| {
        anyhow::anyhow!("Cannot detect input format from {}", source.display())
    })?;
    let to = ModelFormat::from_path(destination).ok_or_else(|| {
        anyhow::anyhow!("Cannot detect output format from {}", destination.display())
    })?;

    println!(
        "Converting {} -> {}",
        from.extension().to_uppercase(),
        to.extension().to_uppercase()
    );
    convert_file(source, destination)?;

    print_done(start.elapsed());
    Ok(())
}
