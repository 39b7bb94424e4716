use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::traits::KeyValueStorage;
use crate::errors::CoreError;

/// Key-value storage backed by one `<key>.json` file per key in a data
/// directory (native only, not WASM).
#[derive(Debug, Clone)]
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of the file holding `key`.
    pub fn path(&self, key: &str) -> Result<PathBuf, CoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(CoreError::ValidationError(format!(
                "storage key '{key}' is not a valid file name"
            )));
        }
        Ok(self.data_dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, CoreError> {
        let path = self.path(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::StorageRead(format!("{}: {e}", path.display()))),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            CoreError::StorageWrite(format!("{}: {e}", self.data_dir.display()))
        })?;
        fs::write(&path, value)
            .map_err(|e| CoreError::StorageWrite(format!("{}: {e}", path.display())))
    }

    fn remove_item(&self, key: &str) -> Result<(), CoreError> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::StorageWrite(format!("{}: {e}", path.display()))),
        }
    }
}
