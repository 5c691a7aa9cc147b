use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::{DocumentRepository, RepositoryError};

#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// `<file>.corrupt-<UTC timestamp>`, next to the document.
    fn backup_path(&self, at: DateTime<Utc>) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(format!(".corrupt-{}", at.format("%Y%m%dT%H%M%S%.3fZ")));
        self.path.with_file_name(name)
    }
}

impl DocumentRepository for JsonFileRepository {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn load(&self) -> Result<Option<Vec<u8>>, RepositoryError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Writes next to the target and renames over it, so readers never see a
    /// half-written document.
    fn save(&self, document: &[u8]) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = self.temp_path();
        fs::write(&temp_path, document)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn preserve(&self, document: &[u8]) -> Result<String, RepositoryError> {
        let backup_path = self.backup_path(Utc::now());
        fs::write(&backup_path, document)?;
        Ok(backup_path.display().to_string())
    }
}
