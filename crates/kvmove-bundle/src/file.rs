use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use kvmove_core::{MigrateError, SecretRecord};
use tempfile::NamedTempFile;
use tracing::instrument;

use crate::codec::{decode, encode};

/// Encode `records` completely, then atomically replace the file at `path`.
/// On any failure the previous file (if any) is left as it was.
#[instrument(skip_all, fields(path = %path.display(), records = records.len()))]
pub fn write_bundle(path: &Path, records: &[SecretRecord]) -> Result<(), MigrateError> {
    let bytes = encode(records)?;

    let parent = parent_dir(path);
    fs::create_dir_all(&parent).map_err(|e| io_err(path, e))?;

    let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| io_err(path, e))?;
    tmp.write_all(&bytes).map_err(|e| io_err(path, e))?;
    tmp.flush().map_err(|e| io_err(path, e))?;
    tmp.persist(path).map_err(|e| io_err(path, e.error))?;
    Ok(())
}

/// Read and strictly decode the bundle at `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_bundle(path: &Path) -> Result<Vec<SecretRecord>, MigrateError> {
    let bytes = fs::read(path).map_err(|e| io_err(path, e))?;
    decode(&bytes)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn io_err<E: ToString>(path: &Path, err: E) -> MigrateError {
    MigrateError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use kvmove_core::{ErrorKind, FieldValue, Fields};

    use super::*;

    fn sample() -> Vec<SecretRecord> {
        vec![SecretRecord::new(
            "app/db",
            Fields::from([("encrypted".to_string(), FieldValue::from("hunter2"))]),
        )]
    }

    #[test]
    fn writes_then_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("export.json");

        write_bundle(&path, &sample()).expect("write");
        let loaded = read_bundle(&path).expect("read");
        assert_eq!(loaded, sample());
    }

    #[test]
    fn overwrite_replaces_previous_bundle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.json");

        write_bundle(&path, &sample()).expect("first write");
        write_bundle(&path, &[]).expect("second write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "[]\n");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_bundle(&dir.path().join("absent.json")).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.json");
        write_bundle(&path, &sample()).expect("write");

        let entries: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("export.json")]);
    }
}
