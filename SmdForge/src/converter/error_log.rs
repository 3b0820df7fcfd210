//! Batch failure logs

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use super::BatchFailure;
use crate::error::Result;

/// Write `<dir>/<timestamp>.log` listing each failure with its error chain
///
/// Returns the path of the written log.
pub fn write_error_log<P: AsRef<Path>>(
    dir: P,
    input: &Path,
    failures: &[BatchFailure],
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let now = Local::now();
    let path = dir.join(format!("{}.log", now.format("%Y-%m-%dT%H-%M-%S%.3f")));

    let mut content = String::new();
    let _ = writeln!(content, "SmdForge {}", crate::VERSION);
    let _ = writeln!(content, "Batch of {} at {}", input.display(), now.to_rfc3339());
    let _ = writeln!(content, "{} failed file(s)", failures.len());
    for failure in failures {
        let _ = writeln!(content);
        let _ = writeln!(content, "{}", failure.path.display());
        let _ = writeln!(content, "    {}", failure.error.root());
        let mut source = std::error::Error::source(failure.error.root());
        while let Some(cause) = source {
            let _ = writeln!(content, "    caused by: {cause}");
            source = cause.source();
        }
    }

    fs::write(&path, content)?;
    tracing::info!("Wrote error log {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_log_lists_failures() {
        let dir = tempfile::tempdir().unwrap();
        let failures = vec![BatchFailure {
            path: PathBuf::from("eevee/body.bmd"),
            error: Error::codec_at(0x10, "unexpected end of data reading node name")
                .in_file("eevee/body.bmd"),
        }];

        let log = write_error_log(dir.path().join("errors"), Path::new("in"), &failures).unwrap();
        assert_eq!(log.extension().and_then(|e| e.to_str()), Some("log"));

        let content = fs::read_to_string(&log).unwrap();
        assert!(content.contains("1 failed file(s)"));
        assert!(content.contains("eevee/body.bmd\n    offset 0x10: unexpected end of data reading node name"));
    }
}
