use crate::commands::{CmdMessage, CmdResult};
use crate::config::PlaygroundConfig;
use crate::error::Result;
use crate::export::{standalone_document, write_document, ExportOptions};
use crate::pipeline::Render;
use crate::preference::{AmbientScheme, RootAttribute, ThemeSync};
use crate::render::RenderCoordinator;
use crate::samples::SampleSource;
use crate::session::DocumentSession;
use crate::store::{RecordStore, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

pub struct ExportRequest {
    pub title: Option<String>,
    /// A file, or a directory to write the configured file name into.
    pub output: PathBuf,
}

pub async fn run<B: StorageBackend, R: Render>(
    store: &RecordStore<B>,
    samples: &dyn SampleSource,
    coordinator: &RenderCoordinator<R>,
    ambient: Arc<dyn AmbientScheme>,
    config: &PlaygroundConfig,
    request: ExportRequest,
) -> Result<CmdResult> {
    let session = DocumentSession::open(store, samples).await;
    let rendered = coordinator.render_now(session.content());

    let root = Arc::new(RootAttribute::new());
    let sync = ThemeSync::new(store, ambient).with_target(root.clone());
    if let Err(e) = sync.initialize().await {
        warn!(error = %e, "exporting with unsaved theme");
    }

    let options = ExportOptions {
        title: request
            .title
            .unwrap_or_else(|| config.export_title.clone()),
        theme: root.get().unwrap_or_else(|| sync.current()),
    };
    let html = standalone_document(&rendered.html, &options)?;
    let path = write_document(&request.output, &config.export_file_name, &html)?;

    let mut result = CmdResult::default()
        .with_rendered(rendered)
        .with_theme(options.theme);
    result.add_message(CmdMessage::success(format!(
        "Exported to {}",
        path.display()
    )));
    Ok(result.with_written(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Theme;
    use crate::preference::FixedScheme;
    use crate::samples::DirSamples;
    use crate::store::memory::fixtures::StoreFixture;
    use std::fs;

    #[tokio::test]
    async fn test_export_writes_themed_document() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = StoreFixture::new()
            .with_document("# Notes\n\n<script>x()</script>")
            .with_theme(Theme::Dark);
        let coordinator = RenderCoordinator::default();

        let result = run(
            &fixture.store,
            &DirSamples::new(dir.path().join("samples")),
            &coordinator,
            Arc::new(FixedScheme(Theme::Light)),
            &PlaygroundConfig::default(),
            ExportRequest {
                title: Some("My Notes".to_string()),
                output: dir.path().to_path_buf(),
            },
        )
        .await
        .unwrap();

        let path = result.written.unwrap();
        assert_eq!(path, dir.path().join("markdown-content.html"));
        let html = fs::read_to_string(path).unwrap();
        assert!(html.contains("<title>My Notes</title>"));
        assert!(html.contains("data-theme=\"dark\""));
        assert!(html.contains("<h1>Notes</h1>"));
        assert!(!html.contains("x()"));
    }

    #[tokio::test]
    async fn test_export_uses_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = StoreFixture::new().with_document("text");
        let mut config = PlaygroundConfig::default();
        config.set("export-title", "Configured").unwrap();
        config.set("export-file-name", "out.html").unwrap();

        let result = run(
            &fixture.store,
            &DirSamples::new(dir.path()),
            &RenderCoordinator::default(),
            Arc::new(FixedScheme(Theme::Light)),
            &config,
            ExportRequest {
                title: None,
                output: dir.path().to_path_buf(),
            },
        )
        .await
        .unwrap();

        let html = fs::read_to_string(result.written.unwrap()).unwrap();
        assert!(html.contains("<title>Configured</title>"));
        assert!(dir.path().join("out.html").is_file());
    }
}
