//! Creating the application's working directories.

use std::fs;
use std::path::Path;

use super::error::PathError;

/// Marker written and removed again to confirm a directory accepts files.
const WRITE_CHECK_FILE: &str = ".vidgrab_write_check";

/// Create `dir` (with parents) if needed and check that files can be written
/// into it.
pub fn ensure_writable_dir(dir: &Path) -> Result<(), PathError> {
    if dir.as_os_str().is_empty() {
        return Err(PathError::EmptyPath);
    }
    if dir.exists() && !dir.is_dir() {
        return Err(PathError::NotADirectory(dir.to_path_buf()));
    }

    fs::create_dir_all(dir).map_err(|e| PathError::CreateFailed {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    check_writable(dir)
}

/// Write and delete a marker file inside `dir`.
pub fn check_writable(dir: &Path) -> Result<(), PathError> {
    let marker = dir.join(WRITE_CHECK_FILE);
    fs::write(&marker, b"ok").map_err(|e| PathError::NotWritable {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    // A leftover marker is harmless
    let _ = fs::remove_file(&marker);
    Ok(())
}
