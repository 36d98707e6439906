use crate::error::{LibraryError, LibraryResult};
use crate::metadata::{DateSource, TagMap, PRIMARY_DATE_TAG, SECONDARY_DATE_TAG};
use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Outcome of looking a single date tag up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagDate {
    Parsed(NaiveDateTime),
    Unparsable(String),
    Missing,
}

impl TagDate {
    pub fn lookup(tags: &TagMap, tag: &str) -> Self {
        match tags.get(tag) {
            None => Self::Missing,
            Some(raw) => match parse_exif_date(raw) {
                Some(date) => Self::Parsed(date),
                None => Self::Unparsable(raw.clone()),
            },
        }
    }

    pub fn parsed(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Parsed(date) => Some(*date),
            _ => None,
        }
    }
}

/// Parses `YYYY:MM:DD HH:MM:SS` exactly; any other shape is `None`.
pub fn parse_exif_date(raw: &str) -> Option<NaiveDateTime> {
    let bytes = raw.as_bytes();
    if bytes.len() != 19 {
        return None;
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 | 13 | 16 => *b == b':',
        10 => *b == b' ',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, EXIF_DATE_FORMAT).ok()
}

/// Primary then secondary tag. Unparsable values fall through like missing ones.
pub fn date_from_tags(tags: &TagMap) -> Option<(NaiveDateTime, DateSource)> {
    let candidates = [
        (PRIMARY_DATE_TAG, DateSource::DateTimeOriginal),
        (SECONDARY_DATE_TAG, DateSource::ImageDateTime),
    ];
    for (tag, source) in candidates {
        match TagDate::lookup(tags, tag) {
            TagDate::Parsed(date) => return Some((date, source)),
            TagDate::Unparsable(raw) => {
                debug!(tag, value = %raw, "ignoring unparsable date tag");
            }
            TagDate::Missing => {}
        }
    }
    None
}

pub fn file_modified_local(path: &Path) -> LibraryResult<NaiveDateTime> {
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|err| LibraryError::io("read modification time", path, err))?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}

pub fn resolve_capture_date(
    tags: &TagMap,
    path: &Path,
    file_time_fallback: bool,
) -> LibraryResult<(NaiveDateTime, DateSource)> {
    if let Some(found) = date_from_tags(tags) {
        return Ok(found);
    }
    if !file_time_fallback {
        return Err(LibraryError::DateResolution {
            path: path.to_path_buf(),
        });
    }
    match file_modified_local(path) {
        Ok(date) => Ok((date, DateSource::FallbackFileModified)),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "file time fallback failed");
            Err(LibraryError::DateResolution {
                path: path.to_path_buf(),
            })
        }
    }
}
