use crate::error::{LibraryError, LibraryResult};
use filetime::{set_file_times, FileTime};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};

const COMPARE_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    Unsupported,
}

/// Overwrites a file's creation timestamp where the platform allows it.
pub trait CreationTimePatcher {
    fn set_creation_time(&self, path: &Path, time: SystemTime) -> io::Result<PatchOutcome>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCreationTime;

impl CreationTimePatcher for NativeCreationTime {
    fn set_creation_time(&self, path: &Path, time: SystemTime) -> io::Result<PatchOutcome> {
        match set_created(path, time) {
            Err(err) if err.kind() == io::ErrorKind::Unsupported => Ok(PatchOutcome::Unsupported),
            other => other,
        }
    }
}

#[cfg(windows)]
fn set_created(path: &Path, time: SystemTime) -> io::Result<PatchOutcome> {
    use std::fs::FileTimes;
    use std::os::windows::fs::FileTimesExt;

    let file = OpenOptions::new().write(true).open(path)?;
    file.set_times(FileTimes::new().set_created(time))?;
    Ok(PatchOutcome::Applied)
}

#[cfg(target_os = "macos")]
fn set_created(path: &Path, time: SystemTime) -> io::Result<PatchOutcome> {
    use std::fs::FileTimes;
    use std::os::macos::fs::FileTimesExt;

    let file = OpenOptions::new().write(true).open(path)?;
    file.set_times(FileTimes::new().set_created(time))?;
    Ok(PatchOutcome::Applied)
}

#[cfg(not(any(windows, target_os = "macos")))]
fn set_created(_path: &Path, _time: SystemTime) -> io::Result<PatchOutcome> {
    Ok(PatchOutcome::Unsupported)
}

/// Copies `source` to the not-yet-existing `dest`, keeping access and
/// modification times, then patches the creation time. On any failure the
/// file this call created is removed again.
pub fn copy_into_library(
    source: &Path,
    dest: &Path,
    patcher: &dyn CreationTimePatcher,
) -> LibraryResult<()> {
    let source_meta =
        fs::metadata(source).map_err(|err| LibraryError::io("read metadata", source, err))?;

    copy_content(source, dest)?;

    if let Err(err) = finish_copy(source, dest, &source_meta, patcher) {
        remove_own_copy(dest);
        return Err(err);
    }
    Ok(())
}

fn finish_copy(
    source: &Path,
    dest: &Path,
    source_meta: &fs::Metadata,
    patcher: &dyn CreationTimePatcher,
) -> LibraryResult<()> {
    set_file_times(
        dest,
        FileTime::from_last_access_time(source_meta),
        FileTime::from_last_modification_time(source_meta),
    )
    .map_err(|err| LibraryError::io("set file times", dest, err))?;

    match source_meta.created() {
        Ok(created) => match patcher.set_creation_time(dest, created) {
            Ok(PatchOutcome::Applied) => {}
            Ok(PatchOutcome::Unsupported) => {
                debug!(path = %dest.display(), "creation time patch unsupported");
            }
            Err(err) => return Err(LibraryError::io("set creation time", dest, err)),
        },
        Err(err) => {
            warn!(path = %source.display(), error = %err, "source creation time unavailable");
        }
    }

    fs::set_permissions(dest, source_meta.permissions())
        .map_err(|err| LibraryError::io("copy permissions", dest, err))
}

// `create_new` refuses to touch an existing path.
fn copy_content(source: &Path, dest: &Path) -> LibraryResult<()> {
    let mut reader = File::open(source).map_err(|err| LibraryError::io("open source", source, err))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|err| LibraryError::io("create destination", dest, err))?;

    let copied = io::copy(&mut reader, &mut writer).and_then(|_| writer.sync_all());
    drop(writer);
    if let Err(err) = copied {
        remove_own_copy(dest);
        return Err(LibraryError::io("copy content", dest, err));
    }
    Ok(())
}

fn remove_own_copy(dest: &Path) {
    if let Err(err) = fs::remove_file(dest) {
        warn!(path = %dest.display(), error = %err, "could not remove unfinished copy");
    }
}

/// Full byte comparison. Anything that is not a regular file never matches.
pub fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    let meta_a = fs::metadata(a)?;
    let meta_b = fs::metadata(b)?;
    if !meta_a.is_file() || !meta_b.is_file() || meta_a.len() != meta_b.len() {
        return Ok(false);
    }

    let mut reader_a = BufReader::new(File::open(a)?);
    let mut reader_b = BufReader::new(File::open(b)?);
    let mut buf_a = vec![0u8; COMPARE_CHUNK];
    let mut buf_b = vec![0u8; COMPARE_CHUNK];
    loop {
        let read = reader_a.read(&mut buf_a)?;
        if read == 0 {
            return Ok(true);
        }
        reader_b.read_exact(&mut buf_b[..read])?;
        if buf_a[..read] != buf_b[..read] {
            return Ok(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct RecordingPatcher {
        calls: RefCell<Vec<PathBuf>>,
        outcome: io::Result<PatchOutcome>,
    }

    impl RecordingPatcher {
        fn returning(outcome: io::Result<PatchOutcome>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome,
            }
        }
    }

    impl CreationTimePatcher for RecordingPatcher {
        fn set_creation_time(&self, path: &Path, _time: SystemTime) -> io::Result<PatchOutcome> {
            self.calls.borrow_mut().push(path.to_path_buf());
            match &self.outcome {
                Ok(outcome) => Ok(*outcome),
                Err(err) => Err(io::Error::new(err.kind(), err.to_string())),
            }
        }
    }

    #[test]
    fn copy_preserves_content_and_modification_time() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("a.jpg");
        let dest = temp.path().join("b.jpg");
        fs::write(&source, b"image bytes").expect("write source");
        let mtime = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&source, mtime).expect("set mtime");

        copy_into_library(&source, &dest, &NativeCreationTime).expect("copy");

        assert_eq!(fs::read(&dest).expect("read dest"), b"image bytes");
        let dest_meta = fs::metadata(&dest).expect("dest metadata");
        assert_eq!(FileTime::from_last_modification_time(&dest_meta), mtime);
    }

    #[test]
    fn copy_refuses_to_overwrite() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("a.jpg");
        let dest = temp.path().join("b.jpg");
        fs::write(&source, b"new").expect("write source");
        fs::write(&dest, b"old").expect("write dest");

        let err = copy_into_library(&source, &dest, &NativeCreationTime).expect_err("must not overwrite");
        assert!(err.to_string().contains("create destination"));
        assert_eq!(fs::read(&dest).expect("read dest"), b"old");
    }

    #[test]
    fn unsupported_creation_time_is_not_an_error() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("a.jpg");
        let dest = temp.path().join("b.jpg");
        fs::write(&source, b"x").expect("write source");

        let patcher = RecordingPatcher::returning(Ok(PatchOutcome::Unsupported));
        copy_into_library(&source, &dest, &patcher).expect("unsupported patch is a no-op");
        assert_eq!(fs::read(&dest).expect("read dest"), b"x");

        let again = temp.path().join("c.jpg");
        copy_into_library(&source, &again, &NativeCreationTime).expect("native patcher never fails the copy");
        assert!(again.exists());
    }

    #[test]
    fn patch_failure_other_than_unsupported_surfaces() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("a.jpg");
        let dest = temp.path().join("b.jpg");
        fs::write(&source, b"x").expect("write source");
        if fs::metadata(&source).and_then(|m| m.created()).is_err() {
            return;
        }

        let patcher =
            RecordingPatcher::returning(Err(io::Error::from(io::ErrorKind::PermissionDenied)));
        let err = copy_into_library(&source, &dest, &patcher).expect_err("patch failure surfaces");
        assert!(err.to_string().contains("set creation time"));
        assert_eq!(patcher.calls.borrow().as_slice(), &[dest.clone()]);
        assert!(!dest.exists(), "unfinished copy must not stay in the library");
    }

    #[test]
    fn failed_copy_leaves_no_file_and_next_attempt_copies_again() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("a.jpg");
        let dest = temp.path().join("b.jpg");
        fs::write(&source, b"x").expect("write source");
        if fs::metadata(&source).and_then(|m| m.created()).is_err() {
            return;
        }

        let failing =
            RecordingPatcher::returning(Err(io::Error::from(io::ErrorKind::PermissionDenied)));
        copy_into_library(&source, &dest, &failing).expect_err("first attempt fails");
        assert!(!dest.exists());

        let working = RecordingPatcher::returning(Ok(PatchOutcome::Applied));
        copy_into_library(&source, &dest, &working).expect("retry succeeds");
        assert_eq!(fs::read(&dest).expect("read dest"), b"x");
    }

    #[test]
    fn files_identical_compares_every_byte() {
        let temp = tempdir().expect("tempdir");
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        let c = temp.path().join("c");
        let big: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let mut tweaked = big.clone();
        tweaked[150_000] ^= 0xff;
        fs::write(&a, &big).expect("write a");
        fs::write(&b, &big).expect("write b");
        fs::write(&c, &tweaked).expect("write c");

        assert!(files_identical(&a, &b).expect("compare"));
        assert!(!files_identical(&a, &c).expect("compare"));
        assert!(!files_identical(&a, temp.path()).expect("directory never matches"));
    }
}
