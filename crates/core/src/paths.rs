//! Filesystem helpers.

use std::path::Path;

use crate::{Error, Result};

/// Ensure `path` exists as a directory, creating parents as needed.
///
/// Creating a directory that already exists is not an error.
///
/// # Errors
///
/// Returns [`Error::NotADirectory`] if the path exists but is not a
/// directory, or the underlying IO error from directory creation.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(Error::not_a_directory(path));
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}
