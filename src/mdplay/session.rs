//! The current document, kept in memory and mirrored to the store.

use crate::error::Result;
use crate::model::Document;
use crate::samples::{SampleSource, INTRO_SAMPLE};
use crate::store::{RecordStore, StorageBackend};
use tracing::{debug, info, warn};

pub const WELCOME_TEXT: &str =
    "# Welcome to the Markdown Playground\n\nStart typing to see the preview.";

/// Where the session's starting content came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Stored,
    Sample(String),
    Welcome,
}

pub struct DocumentSession<'s, B: StorageBackend> {
    store: &'s RecordStore<B>,
    content: String,
    origin: Origin,
}

impl<'s, B: StorageBackend> DocumentSession<'s, B> {
    /// Stored document, else the intro sample, else the welcome text.
    ///
    /// A failed read is logged and treated like an empty store. Bootstrap
    /// content is not written back until the first edit.
    pub async fn open(store: &'s RecordStore<B>, samples: &dyn SampleSource) -> Self {
        match store.get_document().await {
            Ok(Some(doc)) => {
                debug!(len = doc.content.len(), "opened stored document");
                return Self {
                    store,
                    content: doc.content,
                    origin: Origin::Stored,
                };
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read the stored document"),
        }

        let (content, origin) = match samples.fetch(INTRO_SAMPLE) {
            Ok(content) => (content, Origin::Sample(INTRO_SAMPLE.to_string())),
            Err(e) => {
                warn!(error = %e, "intro sample unavailable, using welcome text");
                (WELCOME_TEXT.to_string(), Origin::Welcome)
            }
        };
        info!(origin = ?origin, "no stored document");
        Self {
            store,
            content,
            origin,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Replace the content, then persist it.
    ///
    /// The in-memory content is kept even if the write fails; the error is
    /// returned so callers can decide whether to retry.
    pub async fn edit(&mut self, content: impl Into<String>) -> Result<()> {
        self.content = content.into();
        if let Err(e) = self.store.put_document(&Document::new(self.content.as_str())).await {
            warn!(error = %e, "document not saved, continuing with in-memory copy");
            return Err(e);
        }
        Ok(())
    }

    /// Load a named sample as if the user had typed it.
    pub async fn load_sample(&mut self, samples: &dyn SampleSource, name: &str) -> Result<()> {
        let content = samples.fetch(name)?;
        self.origin = Origin::Sample(name.to_string());
        self.edit(content).await
    }

    /// Persist the bootstrap content if nothing is stored yet.
    pub async fn persist_if_new(&mut self) -> Result<()> {
        if self.origin == Origin::Stored {
            return Ok(());
        }
        let content = std::mem::take(&mut self.content);
        self.edit(content).await?;
        self.origin = Origin::Stored;
        Ok(())
    }
}
