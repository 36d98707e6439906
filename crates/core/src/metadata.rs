use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const PRIMARY_DATE_TAG: &str = "EXIF DateTimeOriginal";
pub const SECONDARY_DATE_TAG: &str = "Image DateTime";
pub const MAKE_TAG: &str = "Image Make";
pub const UNKNOWN_MAKE: &str = "Unknown";

/// Decoded metadata of one file, keyed by `"<Group> <TagName>"`.
pub type TagMap = HashMap<String, String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateSource {
    DateTimeOriginal,
    ImageDateTime,
    FallbackFileModified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub source_path: PathBuf,
    pub capture_date: NaiveDateTime,
    pub date_source: DateSource,
    pub make: String,
}

/// The make exactly as stored; only a missing or empty value becomes
/// [`UNKNOWN_MAKE`]. Cleaning up is left to `sanitize_make`.
pub fn make_from_tags(tags: &TagMap) -> String {
    tags.get(MAKE_TAG)
        .filter(|v| !v.is_empty())
        .map(String::as_str)
        .unwrap_or(UNKNOWN_MAKE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{make_from_tags, TagMap, MAKE_TAG, UNKNOWN_MAKE};

    #[test]
    fn make_defaults_to_unknown_when_missing_or_empty() {
        let mut tags = TagMap::new();
        assert_eq!(make_from_tags(&tags), UNKNOWN_MAKE);

        tags.insert(MAKE_TAG.to_string(), String::new());
        assert_eq!(make_from_tags(&tags), UNKNOWN_MAKE);
    }

    #[test]
    fn make_is_kept_verbatim() {
        let mut tags = TagMap::new();
        tags.insert(MAKE_TAG.to_string(), "  Canon ".to_string());
        assert_eq!(make_from_tags(&tags), "  Canon ");
    }
}
