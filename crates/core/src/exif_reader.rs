use crate::error::{LibraryError, LibraryResult};
use crate::metadata::TagMap;
use exif::{Context, Field, In, Reader, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Reads the embedded tags of `path`. A file without decodable metadata
/// yields an empty map; only failing to open the file is an error.
pub fn read_tags(path: &Path) -> LibraryResult<TagMap> {
    let file = File::open(path).map_err(|err| LibraryError::io("open for metadata", path, err))?;
    let mut buf = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf) {
        Ok(exif) => exif,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no readable metadata");
            return Ok(TagMap::new());
        }
    };

    let mut tags = TagMap::new();
    for field in exif.fields() {
        let key = format!("{} {}", group_name(field), field.tag);
        if let Some(value) = field_value(field, &exif) {
            tags.entry(key).or_insert(value);
        }
    }
    Ok(tags)
}

fn group_name(field: &Field) -> &'static str {
    if field.ifd_num == In::THUMBNAIL {
        return "Thumbnail";
    }
    match field.tag.context() {
        Context::Exif => "EXIF",
        Context::Gps => "GPS",
        Context::Interop => "Interoperability",
        _ => "Image",
    }
}

// ASCII values are kept raw so dates stay in `YYYY:MM:DD HH:MM:SS` form.
fn field_value(field: &Field, exif: &exif::Exif) -> Option<String> {
    let value = match &field.value {
        Value::Ascii(parts) => {
            let first = parts.first()?;
            String::from_utf8_lossy(first)
                .trim_end_matches(['\0', ' '])
                .to_string()
        }
        _ => field.display_value().with_unit(exif).to_string(),
    };
    Some(value)
}
