use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem storage. Relative paths resolve against `base_path`; absolute paths are used as-is.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Storage for LocalStorage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.full_path(path))?;
        Ok(data)
    }

    fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_string_lossy());

        storage.write_file("exports/2026/woo.csv", b"SKU\nA1\n").unwrap();

        assert_eq!(storage.read_file("exports/2026/woo.csv").unwrap(), b"SKU\nA1\n");
    }

    #[test]
    fn test_absolute_paths_ignore_base() {
        let temp_dir = TempDir::new().unwrap();
        let absolute = temp_dir.path().join("bromic.csv");
        fs::write(&absolute, b"sku\n").unwrap();

        let storage = LocalStorage::new("/does/not/matter");
        assert_eq!(storage.read_file(&absolute.to_string_lossy()).unwrap(), b"sku\n");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_string_lossy());
        assert!(storage.read_file("nope.csv").is_err());
    }
}
