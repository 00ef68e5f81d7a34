use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::Document;
use crate::pipeline::Render;
use crate::render::RenderCoordinator;
use crate::samples::SampleSource;
use crate::session::{DocumentSession, Origin};
use crate::store::{RecordStore, StorageBackend};

/// Store `content` as the current document, replacing whatever was there.
pub async fn save<B: StorageBackend>(store: &RecordStore<B>, content: String) -> Result<CmdResult> {
    let document = Document::new(content);
    store.put_document(&document).await?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Saved document ({} bytes)",
        document.content.len()
    )));
    Ok(result.with_document(document.content, Origin::Stored))
}

/// The current document, bootstrapping it when nothing is stored yet.
pub async fn show<B: StorageBackend, R: Render>(
    store: &RecordStore<B>,
    samples: &dyn SampleSource,
    coordinator: Option<&RenderCoordinator<R>>,
) -> Result<CmdResult> {
    let mut session = DocumentSession::open(store, samples).await;
    let origin = session.origin().clone();

    let mut result = CmdResult::default();
    if origin != Origin::Stored {
        let saved = session.persist_if_new().await;
        result.tolerate(saved, "Starting document")?;
    }

    if let Some(coordinator) = coordinator {
        result = result.with_rendered(coordinator.render_now(session.content()));
    }
    Ok(result.with_document(session.content(), origin))
}

pub async fn load_sample<B: StorageBackend>(
    store: &RecordStore<B>,
    samples: &dyn SampleSource,
    name: &str,
) -> Result<CmdResult> {
    let mut session = DocumentSession::open(store, samples).await;
    session.load_sample(samples, name).await?;

    let mut result =
        CmdResult::default().with_document(session.content(), Origin::Sample(name.to_string()));
    result.add_message(CmdMessage::success(format!("Loaded sample {}", name)));
    Ok(result)
}

pub fn list_samples(samples: &dyn SampleSource) -> Result<CmdResult> {
    let names = samples.list()?;
    let mut result = CmdResult::default();
    if names.is_empty() {
        result.add_message(CmdMessage::info("No samples available."));
    }
    Ok(result.with_samples(names))
}
