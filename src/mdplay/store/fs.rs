use super::StorageBackend;
use crate::error::{PlaygroundError, Result};
use crate::model::RecordKey;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let backend = Self { root: root.into() };
        backend.ensure_dir(&backend.root)?;
        Ok(backend)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, key: RecordKey) -> PathBuf {
        self.root
            .join(key.table())
            .join(format!("{}.json", key.name()))
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(PlaygroundError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn read(&self, key: RecordKey) -> Result<Option<String>> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(PlaygroundError::Io)?;
        Ok(Some(content))
    }

    fn write(&self, key: RecordKey, value: &str) -> Result<()> {
        let table_dir = self.root.join(key.table());
        self.ensure_dir(&table_dir)?;

        let target_path = self.record_path(key);

        // Atomic write
        let tmp_path = table_dir.join(format!(".{}-{}.tmp", key.name(), Uuid::new_v4()));
        fs::write(&tmp_path, value).map_err(PlaygroundError::Io)?;
        if let Err(e) = fs::rename(&tmp_path, &target_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PlaygroundError::Io(e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SettingKey;

    #[test]
    fn test_read_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::open(dir.path().join("db")).unwrap();
        assert!(backend.read(RecordKey::Document).unwrap().is_none());
        assert!(dir.path().join("db").is_dir());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::open(dir.path()).unwrap();
        backend.write(RecordKey::Document, "{\"a\":1}").unwrap();
        assert_eq!(
            backend.read(RecordKey::Document).unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(dir.path().join("documents/lastEdited.json").is_file());
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::open(dir.path()).unwrap();
        let key = RecordKey::Setting(SettingKey::Theme);
        backend.write(key, "one").unwrap();
        backend.write(key, "two").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path().join("settings"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["theme.json".to_string()]);
        assert_eq!(backend.read(key).unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = FsBackend::open(dir.path()).unwrap();
            backend.write(RecordKey::Document, "kept").unwrap();
        }
        let reopened = FsBackend::open(dir.path()).unwrap();
        assert_eq!(
            reopened.read(RecordKey::Document).unwrap().as_deref(),
            Some("kept")
        );
    }

    #[test]
    fn test_write_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::open(dir.path()).unwrap();
        // A file where the table directory should be.
        fs::write(dir.path().join("documents"), "not a dir").unwrap();
        let err = backend.write(RecordKey::Document, "x").unwrap_err();
        assert!(err.is_store_failure());
    }
}
