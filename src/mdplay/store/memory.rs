use super::{RecordStore, StorageBackend};
use crate::error::{PlaygroundError, Result};
use crate::model::RecordKey;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// In-memory storage backend for testing.
///
/// Backend calls run on blocking threads, so the map sits behind a `Mutex`
/// rather than a `RefCell`.
#[derive(Default)]
pub struct MemBackend {
    records: Mutex<HashMap<RecordKey, String>>,
    simulate_write_error: AtomicBool,
    simulate_read_error: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.simulate_read_error.store(simulate, Ordering::SeqCst);
    }

    /// Test helper to plant a raw (possibly malformed) record.
    pub fn insert_raw(&self, key: RecordKey, raw: &str) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, raw.to_string());
    }

    pub fn raw(&self, key: RecordKey) -> Option<String> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }
}

impl StorageBackend for MemBackend {
    fn read(&self, key: RecordKey) -> Result<Option<String>> {
        if self.simulate_read_error.load(Ordering::SeqCst) {
            return Err(PlaygroundError::Store("Simulated read error".to_string()));
        }
        Ok(self.raw(key))
    }

    fn write(&self, key: RecordKey, value: &str) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(PlaygroundError::Store("Simulated write error".to_string()));
        }
        self.insert_raw(key, value);
        Ok(())
    }
}

pub type InMemoryStore = RecordStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        RecordStore::with_backend(MemBackend::new())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{Document, Setting, SettingKey, Theme};

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        pub fn with_document(self, content: &str) -> Self {
            let raw = serde_json::to_string(&Document::new(content)).unwrap();
            self.store.backend().insert_raw(RecordKey::Document, &raw);
            self
        }

        pub fn with_theme(self, theme: Theme) -> Self {
            let raw = serde_json::to_string(&Setting::theme(theme)).unwrap();
            self.store
                .backend()
                .insert_raw(RecordKey::Setting(SettingKey::Theme), &raw);
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::StoreFixture;
    use super::*;
    use crate::model::{SettingKey, Theme};

    #[tokio::test]
    async fn test_fixture_records_are_readable() {
        let fixture = StoreFixture::new()
            .with_document("hello")
            .with_theme(Theme::Dark);
        let doc = fixture.store.get_document().await.unwrap().unwrap();
        assert_eq!(doc.content, "hello");
        let theme = fixture
            .store
            .get_setting(SettingKey::Theme)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(theme.value, Theme::Dark);
    }

    #[test]
    fn test_simulated_errors() {
        let backend = MemBackend::new();
        backend.set_simulate_read_error(true);
        assert!(backend.read(RecordKey::Document).is_err());
        backend.set_simulate_read_error(false);
        backend.set_simulate_write_error(true);
        assert!(backend.write(RecordKey::Document, "x").is_err());
        assert!(backend.raw(RecordKey::Document).is_none());
    }
}
