//! Batch model conversion
//!
//! Walks an input directory (or reads a model archive), converts every file
//! the variant recognises and mirrors the relative layout under the output
//! root. Failures are collected per file; by default the batch keeps going.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use walkdir::WalkDir;
use zip::ZipArchive;

use super::archive::{is_archive, list_model_entries, read_entry};
use super::error_log::write_error_log;
use super::{Direction, FileAction, ModelFormat, Variant};
use crate::error::{Error, Result};
use crate::utils::{normalize_path, with_extension};

/// Options for a batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Binary encoding on the other side of the text
    pub variant: Variant,
    /// Decode (binary to text) or encode (text to binary)
    pub direction: Direction,
    /// Convert files on the rayon pool
    pub parallel: bool,
    /// Stop starting new files after the first failure
    pub stop_on_error: bool,
    /// Where to write a timestamped failure log, if anywhere
    pub error_log_dir: Option<PathBuf>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            direction: Direction::Decode,
            parallel: true,
            stop_on_error: false,
            error_log_dir: None,
        }
    }
}

impl BatchOptions {
    /// Create options for a variant and direction
    #[must_use]
    pub fn new(variant: Variant, direction: Direction) -> Self {
        Self {
            variant,
            direction,
            ..Self::default()
        }
    }

    /// Set whether files are converted in parallel
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set whether the first failure ends the batch
    #[must_use]
    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    /// Set the failure log directory
    #[must_use]
    pub fn with_error_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.error_log_dir = dir;
        self
    }
}

/// Progress update for batch operations
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// Current operation phase
    pub phase: BatchPhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items
    pub total: usize,
    /// Current file being processed (if applicable)
    pub current_file: Option<String>,
}

impl BatchProgress {
    /// Create a new progress update
    #[must_use]
    pub fn new(phase: BatchPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }

    /// Create a progress update with a file name
    #[must_use]
    pub fn with_file(
        phase: BatchPhase,
        current: usize,
        total: usize,
        file: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
        }
    }
}

/// Phase of a batch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// Finding input files
    Scanning,
    /// Reading entries out of an archive
    ReadingArchive,
    /// Converting or cloning files
    Converting,
    /// Operation complete
    Complete,
}

impl BatchPhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scanning => "Scanning files",
            Self::ReadingArchive => "Reading archive",
            Self::Converting => "Converting",
            Self::Complete => "Complete",
        }
    }
}

/// One file that could not be converted
#[derive(Debug)]
pub struct BatchFailure {
    /// Input path, relative to the batch input
    pub path: PathBuf,
    /// What went wrong, tagged with the file
    pub error: Error,
}

/// Result of a batch conversion
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Files attempted (decoded, encoded or cloned)
    pub processed: usize,
    /// Files that succeeded
    pub successful: usize,
    /// Files the batch never started because an earlier one failed
    pub not_started: usize,
    /// Per-file failures in input order
    pub failures: Vec<BatchFailure>,
    /// Failure log written for this batch, if any
    pub error_log: Option<PathBuf>,
    /// Wall time of the whole batch
    pub elapsed: Duration,
}

impl BatchResult {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.not_started == 0
    }
}

/// One file of batch work
#[derive(Debug)]
struct Job {
    /// Where the bytes come from
    source: JobSource,
    /// Path relative to the input (and output) root
    relative: PathBuf,
    action: FileAction,
}

#[derive(Debug)]
enum JobSource {
    File(PathBuf),
    Archive(Vec<u8>),
}

enum Outcome {
    Done,
    Failed(BatchFailure),
    NotStarted,
}

/// Find every file under `dir` the variant would convert or clone
///
/// Returns `(path, action)` pairs sorted by path.
pub fn find_model_files<P: AsRef<Path>>(
    dir: P,
    variant: Variant,
    direction: Direction,
) -> Result<Vec<(PathBuf, FileAction)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let action = variant.classify(entry.path(), direction);
        if action != FileAction::Skip {
            files.push((entry.into_path(), action));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Convert a directory tree or model archive
///
/// `input` is a directory, or for decoding a `.jar`/`.zip` archive. Output
/// files keep their relative location; decoded and encoded files have their
/// final extension replaced.
///
/// # Errors
///
/// Only setup failures (unreadable input, bad archive) fail the call;
/// per-file errors are reported in [`BatchResult::failures`].
pub fn batch_convert<F>(
    input: &Path,
    output: &Path,
    options: &BatchOptions,
    progress: F,
) -> Result<BatchResult>
where
    F: Fn(&BatchProgress) + Send + Sync,
{
    let start = Instant::now();
    tracing::info!(
        "Batch {} ({}): {} → {}",
        options.direction,
        options.variant,
        input.display(),
        output.display()
    );

    let jobs = if input.is_file() && is_archive(input) {
        archive_jobs(input, options, &progress)?
    } else {
        progress(&BatchProgress::new(BatchPhase::Scanning, 0, 0));
        find_model_files(input, options.variant, options.direction)?
            .into_iter()
            .map(|(path, action)| Job {
                relative: path.strip_prefix(input).unwrap_or(&path).to_path_buf(),
                source: JobSource::File(path),
                action,
            })
            .collect()
    };

    fs::create_dir_all(output)?;
    let mut result = run_jobs(&jobs, output, options, &progress);
    result.elapsed = start.elapsed();

    if !result.failures.is_empty() {
        if let Some(dir) = &options.error_log_dir {
            match write_error_log(dir, input, &result.failures) {
                Ok(path) => result.error_log = Some(path),
                Err(e) => tracing::warn!("Could not write error log to {}: {e}", dir.display()),
            }
        }
    }

    progress(&BatchProgress::new(
        BatchPhase::Complete,
        result.processed,
        jobs.len(),
    ));
    tracing::info!(
        "Converted {} of {} files in {:.2?}",
        result.successful,
        jobs.len(),
        result.elapsed
    );
    Ok(result)
}

fn archive_jobs<F>(input: &Path, options: &BatchOptions, progress: &F) -> Result<Vec<Job>>
where
    F: Fn(&BatchProgress) + Send + Sync,
{
    if options.direction == Direction::Encode {
        return Err(Error::UnsupportedConversion {
            from: "archive".to_string(),
            to: options.variant.binary_extension().to_string(),
        });
    }

    let mut archive =
        ZipArchive::new(File::open(input)?).map_err(|e| Error::from(e).in_file(input))?;
    let entries = list_model_entries(&archive, options.variant);
    tracing::debug!("Archive {} holds {} model entries", input.display(), entries.len());

    let total = entries.len();
    let mut jobs = Vec::with_capacity(total);
    for (i, entry) in entries.into_iter().enumerate() {
        progress(&BatchProgress::with_file(
            BatchPhase::ReadingArchive,
            i + 1,
            total,
            entry.name.as_str(),
        ));
        let data = read_entry(&mut archive, &entry.name).map_err(|e| e.in_file(input))?;
        jobs.push(Job {
            source: JobSource::Archive(data),
            relative: entry.relative,
            action: entry.action,
        });
    }
    Ok(jobs)
}

fn run_jobs<F>(jobs: &[Job], output: &Path, options: &BatchOptions, progress: &F) -> BatchResult
where
    F: Fn(&BatchProgress) + Send + Sync,
{
    let total = jobs.len();
    let destinations: Vec<PathBuf> = jobs
        .iter()
        .map(|job| destination(job, output, options.variant))
        .collect();
    let shadowed = shadowed_by(jobs, &destinations);
    let started = AtomicUsize::new(0);
    let stop = AtomicBool::new(options.stop_on_error && shadowed.iter().any(Option::is_some));

    let run = |(index, job): (usize, &Job)| -> Outcome {
        if let Some(owner) = shadowed[index] {
            let error = Error::InvalidPath(format!(
                "{} is also written from {}",
                destinations[index].display(),
                normalize_path(&jobs[owner].relative)
            ));
            tracing::warn!("Skipping {}: {error}", normalize_path(&job.relative));
            return Outcome::Failed(BatchFailure {
                path: job.relative.clone(),
                error: error.in_file(&job.relative),
            });
        }
        if stop.load(Ordering::SeqCst) {
            return Outcome::NotStarted;
        }

        let shown = normalize_path(&job.relative);
        let current = started.fetch_add(1, Ordering::SeqCst) + 1;
        progress(&BatchProgress::with_file(
            BatchPhase::Converting,
            current,
            total,
            shown.as_str(),
        ));

        match process_job(job, &destinations[index], options.variant) {
            Ok(()) => {
                tracing::debug!("{shown} → {}", destinations[index].display());
                Outcome::Done
            }
            Err(error) => {
                tracing::warn!("Failed {shown}: {error}");
                if options.stop_on_error {
                    stop.store(true, Ordering::SeqCst);
                }
                Outcome::Failed(BatchFailure {
                    path: job.relative.clone(),
                    error,
                })
            }
        }
    };

    let outcomes: Vec<Outcome> = if options.parallel {
        jobs.par_iter().enumerate().map(run).collect()
    } else {
        jobs.iter().enumerate().map(run).collect()
    };

    let mut result = BatchResult::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Done => {
                result.processed += 1;
                result.successful += 1;
            }
            Outcome::Failed(failure) => {
                result.processed += 1;
                result.failures.push(failure);
            }
            Outcome::NotStarted => result.not_started += 1,
        }
    }
    result
}

/// Output path of one job
fn destination(job: &Job, output: &Path, variant: Variant) -> PathBuf {
    let target = output.join(&job.relative);
    match job.action {
        FileAction::Decode => with_extension(target, ModelFormat::Text.extension()),
        FileAction::Encode => with_extension(target, variant.binary_extension()),
        FileAction::Clone | FileAction::Skip => target,
    }
}

/// For each job, the job that already owns its output path, if any
///
/// Converted files claim their paths before cloned ones, then in input
/// order. Paths compare case-insensitively.
fn shadowed_by(jobs: &[Job], destinations: &[PathBuf]) -> Vec<Option<usize>> {
    let mut order: Vec<usize> = (0..jobs.len()).collect();
    order.sort_by_key(|&i| (jobs[i].action == FileAction::Clone, i));

    let mut owners: HashMap<String, usize> = HashMap::new();
    let mut shadowed = vec![None; jobs.len()];
    for i in order {
        let key = normalize_path(&destinations[i]).to_lowercase();
        match owners.get(&key) {
            Some(&owner) => shadowed[i] = Some(owner),
            None => {
                owners.insert(key, i);
            }
        }
    }
    shadowed
}

/// Convert or clone one file into `dest`
fn process_job(job: &Job, dest: &Path, variant: Variant) -> Result<()> {
    let wrap = |e: Error| e.in_file(&job.relative);

    if job.action == FileAction::Skip {
        return Err(wrap(Error::InvalidPath("not a model file".to_string())));
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| wrap(e.into()))?;
    }

    if job.action == FileAction::Clone {
        match &job.source {
            JobSource::File(path) => {
                fs::copy(path, dest).map_err(|e| wrap(e.into()))?;
            }
            JobSource::Archive(data) => fs::write(dest, data).map_err(|e| wrap(e.into()))?,
        }
        return Ok(());
    }

    let loaded;
    let data = match &job.source {
        JobSource::File(path) => {
            loaded = fs::read(path).map_err(|e| wrap(e.into()))?;
            &loaded
        }
        JobSource::Archive(data) => data,
    };

    let bytes = if job.action == FileAction::Decode {
        let model = variant.decode(data).map_err(wrap)?;
        ModelFormat::Text.encode(&model).map_err(wrap)?
    } else {
        let text = std::str::from_utf8(data).map_err(|e| wrap(e.into()))?;
        let model = variant.read_text(text).map_err(wrap)?;
        variant.encode(&model).map_err(wrap)?
    };

    fs::write(dest, bytes).map_err(|e| wrap(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::bmd::serialize_bmd;
    use crate::formats::smd::{Bone, NodesBlock, SkeletonBlock, SmdFile};
    use std::sync::Mutex;

    fn model() -> SmdFile {
        SmdFile::new()
            .with_block(NodesBlock {
                bones: vec![Bone::new(0, "root", -1)],
            })
            .with_block(SkeletonBlock::default())
    }

    fn write(path: &Path, data: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    #[test]
    fn test_find_model_files() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("eevee/body.bmd"), b"");
        write(&dir.path().join("eevee/eevee.pqc"), b"");
        write(&dir.path().join("eevee/skin.png"), b"");

        let files = find_model_files(dir.path(), Variant::Reforged, Direction::Decode).unwrap();
        let actions: Vec<FileAction> = files.iter().map(|(_, a)| *a).collect();
        assert_eq!(actions, vec![FileAction::Decode, FileAction::Clone]);
    }

    #[test]
    fn test_decode_mirrors_tree_and_continues_past_failures() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let logs = tempfile::tempdir().unwrap();

        let bytes = serialize_bmd(&model()).unwrap();
        write(&input.path().join("eevee/body.bmd"), &bytes);
        write(&input.path().join("eevee/broken.bmd"), &bytes[..bytes.len() - 1]);
        write(&input.path().join("eevee/eevee.pqc"), b"$model body.smd");

        let options = BatchOptions::new(Variant::Reforged, Direction::Decode)
            .with_parallel(false)
            .with_error_log_dir(Some(logs.path().to_path_buf()));
        let updates = Mutex::new(Vec::new());
        let result = batch_convert(input.path(), output.path(), &options, |p| {
            updates.lock().unwrap().push(p.phase);
        })
        .unwrap();

        assert_eq!(result.processed, 3);
        assert_eq!(result.successful, 2);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.failures[0].path, PathBuf::from("eevee/broken.bmd"));
        assert!(result.failures[0].error.is_codec_error());
        assert!(result.error_log.as_ref().is_some_and(|p| p.exists()));

        let text = fs::read_to_string(output.path().join("eevee/body.smd")).unwrap();
        assert!(text.starts_with("version 1\nnodes\n0 \"root\" -1\nend\n"));
        assert_eq!(
            fs::read_to_string(output.path().join("eevee/eevee.pqc")).unwrap(),
            "$model body.smd"
        );
        assert!(!output.path().join("eevee/broken.smd").exists());

        let updates = updates.into_inner().unwrap();
        assert_eq!(updates.first(), Some(&BatchPhase::Scanning));
        assert_eq!(updates.last(), Some(&BatchPhase::Complete));
    }

    #[test]
    fn test_clone_sharing_a_decoded_output_is_reported() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(
            &input.path().join("eevee/body.bmd"),
            &serialize_bmd(&model()).unwrap(),
        );
        write(&input.path().join("eevee/body.smd"), b"hand edited");

        let options = BatchOptions::new(Variant::Reforged, Direction::Decode);
        let result = batch_convert(input.path(), output.path(), &options, |_| {}).unwrap();

        assert_eq!(result.processed, 2);
        assert_eq!(result.successful, 1);
        assert_eq!(result.failures[0].path, PathBuf::from("eevee/body.smd"));
        assert!(result.failures[0].error.to_string().contains("eevee/body.bmd"));

        let text = fs::read_to_string(output.path().join("eevee/body.smd")).unwrap();
        assert!(text.starts_with("version 1\nnodes\n"));
    }

    #[test]
    fn test_stop_on_error() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(&input.path().join("a.bmd"), b"\x01");
        write(&input.path().join("b.bmd"), b"\x01");

        let options = BatchOptions::new(Variant::Reforged, Direction::Decode)
            .with_parallel(false)
            .with_stop_on_error(true);
        let result = batch_convert(input.path(), output.path(), &options, |_| {}).unwrap();

        assert_eq!(result.processed, 1);
        assert_eq!(result.not_started, 1);
        assert!(!result.is_success());
        assert!(result.error_log.is_none());
    }

    #[test]
    fn test_encode_generations() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(
            &input.path().join("pikachu/body.smd"),
            b"version 1\nnodes\n0 \"root\" -1\nend\nskeleton\ntime 0\n0  0 0 0  0 0 0\nend\n",
        );

        let options = BatchOptions::new(Variant::Generations, Direction::Encode);
        let result = batch_convert(input.path(), output.path(), &options, |_| {}).unwrap();
        assert!(result.is_success());

        let written = output.path().join("pikachu/body.smdx");
        let model = crate::formats::smdx::read_smdx(&written).unwrap();
        assert_eq!(model.nodes().unwrap().bones[0].name, "root");
    }
}
