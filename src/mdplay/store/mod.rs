//! # Storage Layer
//!
//! Durable key/value storage for the two records mdplay keeps: the current
//! document and the theme setting.
//!
//! ## Layers
//!
//! - [`StorageBackend`]: raw, synchronous record I/O ("how" things are stored).
//!   - [`fs::FsBackend`]: one JSON file per record, atomic writes.
//!   - [`memory::MemBackend`]: in-memory map for tests.
//! - [`RecordStore`]: the async facade every consumer talks to ("what" is stored).
//!   Backend calls run on tokio's blocking pool so callers never stall on I/O.
//!
//! ## Ordering
//!
//! Each [`RecordKey`] has its own FIFO lock. Operations on the same key are
//! serialized in arrival order (last writer wins); operations on different
//! keys never wait on each other and have no ordering between them.
//!
//! ## Storage Format
//!
//! For `FsBackend`:
//! ```text
//! db/
//! ├── documents/
//! │   └── lastEdited.json   # {"id": "lastEdited", "content": "..."}
//! └── settings/
//!     └── theme.json        # {"key": "theme", "value": "dark"}
//! ```
//!
//! There is no versioning: a record that no longer deserializes is reported
//! as a store error, never silently replaced.

use crate::config::PlaygroundPaths;
use crate::error::{PlaygroundError, Result};
use crate::model::{Document, RecordKey, Setting, SettingKey, DOCUMENT_ID};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub mod fs;
pub mod memory;

pub use fs::FsBackend;
pub use memory::{InMemoryStore, MemBackend};

/// Abstract interface for raw record I/O.
///
/// Implementations hold serialized records keyed by [`RecordKey`]. They are
/// shared across blocking tasks, so every method takes `&self`.
pub trait StorageBackend: Send + Sync + 'static {
    /// Read the raw record. Returns Ok(None) when it was never written.
    fn read(&self, key: RecordKey) -> Result<Option<String>>;

    /// Replace the raw record wholesale.
    /// MUST be atomic: a reader sees either the old or the new value.
    fn write(&self, key: RecordKey, value: &str) -> Result<()>;
}

pub type FileRecordStore = RecordStore<FsBackend>;

/// Async record store over a [`StorageBackend`].
pub struct RecordStore<B: StorageBackend> {
    backend: Arc<B>,
    document_lock: Mutex<()>,
    theme_lock: Mutex<()>,
}

impl<B: StorageBackend> RecordStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            document_lock: Mutex::new(()),
            theme_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn lock_for(&self, key: RecordKey) -> &Mutex<()> {
        match key {
            RecordKey::Document => &self.document_lock,
            RecordKey::Setting(SettingKey::Theme) => &self.theme_lock,
        }
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&B) -> Result<T> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || op(&backend))
            .await
            .map_err(|e| PlaygroundError::Store(format!("Storage task failed: {}", e)))?
    }

    /// Fetch and decode a record. Absent records are `None`, never a default.
    pub async fn get<T: DeserializeOwned>(&self, key: RecordKey) -> Result<Option<T>> {
        let _guard = self.lock_for(key).lock().await;
        let raw = self.run(move |backend| backend.read(key)).await?;
        debug!(%key, found = raw.is_some(), "store get");
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode and write a record, replacing whatever was there.
    pub async fn put<T: Serialize>(&self, key: RecordKey, value: &T) -> Result<()> {
        let raw = serde_json::to_string_pretty(value)?;
        let _guard = self.lock_for(key).lock().await;
        debug!(%key, bytes = raw.len(), "store put");
        self.run(move |backend| backend.write(key, &raw)).await
    }

    pub async fn get_document(&self) -> Result<Option<Document>> {
        self.get(RecordKey::Document).await
    }

    pub async fn put_document(&self, document: &Document) -> Result<()> {
        if document.id != DOCUMENT_ID {
            return Err(PlaygroundError::Api(format!(
                "Only the current document can be stored, got id {}",
                document.id
            )));
        }
        self.put(RecordKey::Document, document).await
    }

    pub async fn get_setting(&self, key: SettingKey) -> Result<Option<Setting>> {
        let setting: Option<Setting> = self.get(RecordKey::Setting(key)).await?;
        match setting {
            Some(s) if s.key != key => Err(PlaygroundError::Store(format!(
                "Record {} holds setting {}",
                RecordKey::Setting(key),
                s.key.as_str()
            ))),
            other => Ok(other),
        }
    }

    pub async fn put_setting(&self, setting: &Setting) -> Result<()> {
        self.put(RecordKey::Setting(setting.key), setting).await
    }
}

static SHARED: OnceCell<FileRecordStore> = OnceCell::new();

/// The process-wide file store.
///
/// Initialized once, on first call, from `paths`; every later call returns the
/// same handle regardless of the paths passed. Concurrent first calls block
/// until the single initialization finishes.
pub fn shared(paths: &PlaygroundPaths) -> Result<&'static FileRecordStore> {
    SHARED.get_or_try_init(|| {
        let root = paths.store_dir();
        debug!(root = %root.display(), "opening shared record store");
        FsBackend::open(root).map(RecordStore::with_backend)
    })
}
