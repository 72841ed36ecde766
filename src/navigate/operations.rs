//! Navigation operations implementation

use crate::error::StorageError;
use crate::storage::resolve_path;
use std::path::{Path, PathBuf};

/// Resolves `target` against `cwd` and checks that it names an existing
/// directory. Returns the new working directory on success.
pub fn change_directory(cwd: &Path, target: &str) -> Result<PathBuf, StorageError> {
    let new_path = resolve_path(cwd, target);

    if !new_path.exists() {
        return Err(StorageError::NotFound(new_path));
    }

    if !new_path.is_dir() {
        return Err(StorageError::NotADirectory(new_path));
    }

    Ok(new_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn changes_into_existing_subdirectory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("pub")).unwrap();

        let new_cwd = change_directory(dir.path(), "pub").unwrap();
        assert_eq!(new_cwd, dir.path().join("pub"));
        assert_eq!(change_directory(&new_cwd, "..").unwrap(), dir.path());
    }

    #[test]
    fn rejects_missing_and_non_directory_targets() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file.txt"), b"x").unwrap();

        assert!(matches!(
            change_directory(dir.path(), "missing"),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            change_directory(dir.path(), "file.txt"),
            Err(StorageError::NotADirectory(_))
        ));
    }
}
