use crate::copier::{copy_into_library, files_identical, CreationTimePatcher};
use crate::date_resolver::resolve_capture_date;
use crate::error::{LibraryError, LibraryResult};
use crate::exif_reader::read_tags;
use crate::metadata::{make_from_tags, ImageRecord};
use crate::namer::{probe_destination, DestinationKey, LocalFs, Probe, ProbeFs};
use crate::sanitize::sanitize_make;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub library_root: PathBuf,
    pub file_time_fallback: bool,
    pub sanitize_make: bool,
    pub max_collision_suffix: Option<u32>,
    pub dry_run: bool,
}

impl ImportOptions {
    pub fn new(library_root: impl Into<PathBuf>) -> Self {
        Self {
            library_root: library_root.into(),
            file_time_fallback: true,
            sanitize_make: true,
            max_collision_suffix: None,
            dry_run: false,
        }
    }
}

#[derive(Debug)]
pub enum ImportOutcome {
    Copied(PathBuf),
    Duplicate(PathBuf),
    /// Dry run: where the file would have been copied.
    Planned(PathBuf),
    Failed(LibraryError),
}

/// Destinations claimed by a dry run, mapped to the source that claimed them.
pub type PlannedDestinations = HashMap<PathBuf, PathBuf>;

/// Disk plus the destinations a dry run has already handed out.
struct PlannedFs<'a> {
    planned: &'a PlannedDestinations,
}

impl ProbeFs for PlannedFs<'_> {
    fn exists(&self, path: &Path) -> bool {
        self.planned.contains_key(path) || LocalFs.exists(path)
    }

    fn same_content(&self, a: &Path, b: &Path) -> io::Result<bool> {
        match self.planned.get(b) {
            Some(planned_source) => files_identical(a, planned_source),
            None => files_identical(a, b),
        }
    }
}

pub fn build_record(path: &Path, options: &ImportOptions) -> LibraryResult<ImageRecord> {
    let tags = read_tags(path)?;
    let (capture_date, date_source) =
        resolve_capture_date(&tags, path, options.file_time_fallback)?;
    let make = make_from_tags(&tags);
    let make = if options.sanitize_make {
        sanitize_make(&make)
    } else {
        make
    };

    Ok(ImageRecord {
        source_path: path.to_path_buf(),
        capture_date,
        date_source,
        make,
    })
}

/// Adds one file to the library. Never panics on per-file problems; they come
/// back as [`ImportOutcome::Failed`].
pub fn import_file(
    path: &Path,
    options: &ImportOptions,
    patcher: &dyn CreationTimePatcher,
) -> ImportOutcome {
    import_file_with_plan(path, options, patcher, &mut PlannedDestinations::new())
}

/// Like [`import_file`], but a dry run also treats everything in `planned`
/// as taken, so a run over many files names them the way a real run would.
pub fn import_file_with_plan(
    path: &Path,
    options: &ImportOptions,
    patcher: &dyn CreationTimePatcher,
    planned: &mut PlannedDestinations,
) -> ImportOutcome {
    match try_import(path, options, patcher, planned) {
        Ok(outcome) => outcome,
        Err(err) => ImportOutcome::Failed(err),
    }
}

fn try_import(
    path: &Path,
    options: &ImportOptions,
    patcher: &dyn CreationTimePatcher,
    planned: &mut PlannedDestinations,
) -> LibraryResult<ImportOutcome> {
    let record = build_record(path, options)?;
    let mut key = DestinationKey::new(&record.source_path, record.capture_date, &record.make);
    let folder = key.folder(&options.library_root);

    if !options.dry_run {
        fs::create_dir_all(&folder)
            .map_err(|err| LibraryError::io("create library folder", &folder, err))?;
    }

    let found = if options.dry_run {
        let planned_fs = PlannedFs { planned: &*planned };
        probe_destination(
            &planned_fs,
            &record.source_path,
            &folder,
            &mut key,
            options.max_collision_suffix,
        )?
    } else {
        probe_destination(
            &LocalFs,
            &record.source_path,
            &folder,
            &mut key,
            options.max_collision_suffix,
        )?
    };

    match found {
        Probe::Duplicate(existing) => {
            debug!(source = %path.display(), existing = %existing.display(), "duplicate");
            Ok(ImportOutcome::Duplicate(existing))
        }
        Probe::Vacant(dest) if options.dry_run => {
            planned.insert(dest.clone(), record.source_path.clone());
            Ok(ImportOutcome::Planned(dest))
        }
        Probe::Vacant(dest) => {
            copy_into_library(&record.source_path, &dest, patcher)?;
            debug!(
                source = %path.display(),
                dest = %dest.display(),
                date_source = ?record.date_source,
                "copied"
            );
            Ok(ImportOutcome::Copied(dest))
        }
    }
}
