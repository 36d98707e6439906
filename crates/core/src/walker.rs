use crate::copier::CreationTimePatcher;
use crate::library::{import_file_with_plan, ImportOptions, ImportOutcome, PlannedDestinations};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub processed: usize,
    pub copied: usize,
    pub duplicates: usize,
    pub planned: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Copied,
    Duplicate,
    Planned,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub status: FileStatus,
    pub destination: Option<PathBuf>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub source_root: PathBuf,
    pub library_root: PathBuf,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
    pub stats: ImportStats,
}

impl ImportStats {
    fn record(&mut self, status: FileStatus) {
        self.processed += 1;
        match status {
            FileStatus::Copied => self.copied += 1,
            FileStatus::Duplicate => self.duplicates += 1,
            FileStatus::Planned => self.planned += 1,
            FileStatus::Failed => self.failed += 1,
        }
    }
}

/// Imports every file under `source_root`, one at a time. A failing file is
/// logged and counted; the run keeps going.
pub fn import_tree(
    source_root: &Path,
    skip_file_names: &[String],
    options: &ImportOptions,
    patcher: &dyn CreationTimePatcher,
    mut on_progress: impl FnMut(&ImportStats),
) -> Result<ImportReport> {
    if !source_root.is_dir() {
        anyhow::bail!("source folder does not exist: {}", source_root.display());
    }

    info!(
        source = %source_root.display(),
        library = %options.library_root.display(),
        dry_run = options.dry_run,
        "import started"
    );

    let canonical_source = resolve_root(source_root);
    let canonical_library = resolve_root(&options.library_root);

    let mut stats = ImportStats::default();
    let mut files = Vec::new();
    let mut planned = PlannedDestinations::new();

    for entry in WalkDir::new(source_root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| source_root.to_path_buf());
                error!(path = %path.display(), error = %err, "could not read entry");
                stats.record(FileStatus::Failed);
                files.push(FileReport {
                    source: path,
                    status: FileStatus::Failed,
                    destination: None,
                    error: Some(err.to_string()),
                });
                on_progress(&stats);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let in_library = path
            .strip_prefix(source_root)
            .map(|relative| canonical_source.join(relative).starts_with(&canonical_library))
            .unwrap_or(false);
        if is_skipped(path, skip_file_names) || in_library {
            stats.skipped += 1;
            continue;
        }

        let report = match import_file_with_plan(path, options, patcher, &mut planned) {
            ImportOutcome::Copied(dest) => report(path, FileStatus::Copied, Some(dest), None),
            ImportOutcome::Duplicate(existing) => {
                report(path, FileStatus::Duplicate, Some(existing), None)
            }
            ImportOutcome::Planned(dest) => report(path, FileStatus::Planned, Some(dest), None),
            ImportOutcome::Failed(err) => {
                error!(path = %path.display(), error = %err, "import failed");
                let message = error_chain(&err);
                report(path, FileStatus::Failed, None, Some(message))
            }
        };
        stats.record(report.status);
        files.push(report);
        on_progress(&stats);
    }

    info!(?stats, "import finished");

    Ok(ImportReport {
        source_root: source_root.to_path_buf(),
        library_root: options.library_root.clone(),
        dry_run: options.dry_run,
        files,
        stats,
    })
}

fn report(
    source: &Path,
    status: FileStatus,
    destination: Option<PathBuf>,
    error: Option<String>,
) -> FileReport {
    FileReport {
        source: source.to_path_buf(),
        status,
        destination,
        error,
    }
}

/// Canonical form of `path`. A root that does not exist yet (a fresh library)
/// is resolved through its nearest existing ancestor.
fn resolve_root(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            resolve_root(parent).join(name)
        }
        (_, Some(name)) => resolve_root(Path::new(".")).join(name),
        _ => path.to_path_buf(),
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_skipped(path: &Path, skip_file_names: &[String]) -> bool {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            skip_file_names
                .iter()
                .any(|skip| skip.eq_ignore_ascii_case(&name))
        })
        .unwrap_or(false)
}
