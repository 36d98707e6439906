use crate::copier::files_identical;
use crate::error::{LibraryError, LibraryResult};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const BASE_NAME_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Everything needed to spell a destination path. `suffix_index` is only
/// ever advanced by [`probe_destination`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationKey {
    pub year: i32,
    pub make: String,
    pub base_name: String,
    pub suffix_index: u32,
    pub original_stem: String,
    pub extension: String,
}

impl DestinationKey {
    pub fn new(source_path: &Path, capture_date: NaiveDateTime, make: &str) -> Self {
        let original_stem = source_path
            .file_stem()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = source_path
            .extension()
            .map(|v| format!(".{}", v.to_string_lossy()))
            .unwrap_or_default();

        Self {
            year: capture_date.year(),
            make: make.to_string(),
            base_name: capture_date.format(BASE_NAME_FORMAT).to_string(),
            suffix_index: 0,
            original_stem,
            extension,
        }
    }

    pub fn folder(&self, library_root: &Path) -> PathBuf {
        library_root
            .join(format!("{:04}", self.year))
            .join(&self.make)
    }

    pub fn file_name(&self) -> String {
        let mut name = self.base_name.clone();
        if self.suffix_index > 0 {
            name.push_str(&format!("_{}", self.suffix_index));
        }
        name.push_str(&format!("_({}){}", self.original_stem, self.extension));
        name
    }
}

/// Filesystem questions asked while probing.
pub trait ProbeFs {
    fn exists(&self, path: &Path) -> bool;
    fn same_content(&self, a: &Path, b: &Path) -> io::Result<bool>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ProbeFs for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn same_content(&self, a: &Path, b: &Path) -> io::Result<bool> {
        files_identical(a, b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Vacant(PathBuf),
    Duplicate(PathBuf),
}

/// Walks `_1`, `_2`, ... until a free name or a byte-identical copy shows up.
/// Unbounded unless `limit` is set.
pub fn probe_destination<F: ProbeFs>(
    fs: &F,
    source_path: &Path,
    folder: &Path,
    key: &mut DestinationKey,
    limit: Option<u32>,
) -> LibraryResult<Probe> {
    key.suffix_index = 0;
    loop {
        let candidate = folder.join(key.file_name());
        if !fs.exists(&candidate) {
            return Ok(Probe::Vacant(candidate));
        }

        let identical = fs
            .same_content(source_path, &candidate)
            .map_err(|err| LibraryError::io("compare content", &candidate, err))?;
        if identical {
            return Ok(Probe::Duplicate(candidate));
        }

        debug!(candidate = %candidate.display(), "name taken by different content");
        if limit.is_some_and(|max| key.suffix_index >= max) {
            return Err(LibraryError::CollisionLimit {
                folder: folder.to_path_buf(),
                limit: key.suffix_index,
            });
        }
        key.suffix_index += 1;
    }
}
