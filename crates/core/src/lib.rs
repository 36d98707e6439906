mod config;
mod copier;
mod date_resolver;
mod error;
mod exif_reader;
mod library;
mod metadata;
mod namer;
mod sanitize;
mod walker;

pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
};
pub use copier::{
    copy_into_library, files_identical, CreationTimePatcher, NativeCreationTime, PatchOutcome,
};
pub use date_resolver::{
    date_from_tags, file_modified_local, parse_exif_date, resolve_capture_date, TagDate,
    EXIF_DATE_FORMAT,
};
pub use error::{LibraryError, LibraryResult};
pub use exif_reader::read_tags;
pub use library::{
    build_record, import_file, import_file_with_plan, ImportOptions, ImportOutcome,
    PlannedDestinations,
};
pub use metadata::{
    make_from_tags, DateSource, ImageRecord, TagMap, MAKE_TAG, PRIMARY_DATE_TAG,
    SECONDARY_DATE_TAG, UNKNOWN_MAKE,
};
pub use namer::{probe_destination, DestinationKey, LocalFs, Probe, ProbeFs};
pub use sanitize::sanitize_make;
pub use walker::{import_tree, FileReport, FileStatus, ImportReport, ImportStats};
