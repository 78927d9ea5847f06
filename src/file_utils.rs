//! Whole-document file persistence helpers
//!
//! Both the connection registry and the insecure keyring are small JSON
//! documents that are read completely, changed in memory, and written back
//! completely. Writes go to a temporary file in the target directory which
//! is then renamed over the target, so a concurrent reader sees either the
//! old document or the new one and never a partial write.

use crate::error::{ProjctlError, Result};
use std::io::Write;
use std::path::Path;

/// Read a document, returning `Ok(None)` when the file does not exist
///
/// # Errors
///
/// Returns [`ProjctlError::FileLoad`] for any read failure other than the
/// file being absent.
pub fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => {
            Err(ProjctlError::FileLoad(format!("failed to read {}: {}", path.display(), e)).into())
        }
    }
}

/// Atomically replace `path` with `contents`
///
/// The parent directory is created if needed. On Unix the file is created
/// with owner-only permissions.
///
/// # Errors
///
/// Returns [`ProjctlError::FileWrite`] if the directory, the temporary file,
/// or the final rename cannot be completed.
///
/// # Examples
///
/// ```
/// use projctl::file_utils::write_atomic;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("nested").join("doc.json");
/// write_atomic(&path, b"{}").unwrap();
/// assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
/// ```
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let write_err =
        |e: &dyn std::fmt::Display| ProjctlError::FileWrite(format!("{}: {}", path.display(), e));

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| write_err(&e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_err(&e))?;
    tmp.write_all(contents).map_err(|e| write_err(&e))?;
    tmp.as_file().sync_all().map_err(|e| write_err(&e))?;
    tmp.persist(path).map_err(|e| write_err(&e.error))?;

    Ok(())
}
