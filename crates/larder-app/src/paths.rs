//! Filesystem path helpers for the queue database and archive output.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::QUEUE_DB_FILE;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Container providing filesystem paths for the application. In production this
/// is rooted at the configured data directory; tests construct custom instances.
#[derive(Debug, Clone)]
pub struct AppPaths {
    base_dir: PathBuf,
}

impl AppPaths {
    /// Construct paths rooted under the provided directory, ensuring it exists.
    pub fn new<P: AsRef<Path>>(base: P) -> Result<Self, PathError> {
        let base = base.as_ref().to_path_buf();
        ensure_dir(&base)?;
        Ok(Self { base_dir: base })
    }

    /// Base data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.clone()
    }

    /// Location of the SQLite work queue (`.../queue.sqlite3`).
    pub fn queue_db_path(&self) -> PathBuf {
        self.base_dir.join(QUEUE_DB_FILE)
    }

    /// Directory receiving `.paprikarecipes` archives (`.../archives`).
    pub fn archives_dir(&self) -> Result<PathBuf, PathError> {
        let path = self.base_dir.join("archives");
        ensure_dir(&path)
    }
}

fn ensure_dir(path: &Path) -> Result<PathBuf, PathError> {
    if let Err(err) = fs::create_dir_all(path) {
        if err.kind() != io::ErrorKind::AlreadyExists {
            return Err(PathError::CreateDir {
                path: path.to_path_buf(),
                source: err,
            });
        }
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::AppPaths;
    use tempfile::TempDir;

    #[test]
    fn creates_base_and_archive_dirs() {
        let temp = TempDir::new().expect("temp dir");
        let base = temp.path().join("data");
        let paths = AppPaths::new(&base).expect("app paths");
        assert!(base.is_dir());

        let archives = paths.archives_dir().expect("archives dir");
        assert!(archives.is_dir());
        assert_eq!(archives, base.join("archives"));
    }

    #[test]
    fn queue_db_lives_under_base() {
        let temp = TempDir::new().expect("temp dir");
        let paths = AppPaths::new(temp.path()).expect("app paths");
        assert_eq!(paths.queue_db_path(), temp.path().join("queue.sqlite3"));
    }
}
