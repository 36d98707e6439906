use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("no capture date could be determined: {}", path.display())]
    DateResolution { path: PathBuf },
    #[error("{op} failed: {}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no free name after {limit} suffixes in {}", folder.display())]
    CollisionLimit { folder: PathBuf, limit: u32 },
}

impl LibraryError {
    pub(crate) fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;
