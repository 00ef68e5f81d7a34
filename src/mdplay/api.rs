//! # API Facade
//!
//! A thin facade over the command layer and the single entry point for
//! mdplay operations, whatever the UI.
//!
//! The facade dispatches to `commands/*.rs` and normalizes inputs (theme
//! names, export targets). It does no printing and holds no business logic.
//!
//! `PlaygroundApi<B>` is generic over the storage backend:
//! - Production: `PlaygroundApi<'static, FsBackend>` over [`crate::store::shared`]
//! - Testing: `PlaygroundApi<'_, MemBackend>` over an `InMemoryStore`

use crate::commands;
use crate::config::{PlaygroundConfig, PlaygroundPaths};
use crate::error::Result;
use crate::model::Theme;
use crate::pipeline::Pipeline;
use crate::preference::{AmbientScheme, SystemScheme};
use crate::render::RenderCoordinator;
use crate::samples::DirSamples;
use crate::store::{RecordStore, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;

pub use commands::config::ConfigAction;
pub use commands::theme::ThemeAction;
pub use commands::{CmdMessage, CmdResult, MessageLevel};

pub struct PlaygroundApi<'s, B: StorageBackend> {
    store: &'s RecordStore<B>,
    paths: PlaygroundPaths,
    config: PlaygroundConfig,
    samples: DirSamples,
    coordinator: RenderCoordinator,
    ambient: Arc<dyn AmbientScheme>,
}

impl<'s, B: StorageBackend> PlaygroundApi<'s, B> {
    pub fn new(
        store: &'s RecordStore<B>,
        paths: PlaygroundPaths,
        config: PlaygroundConfig,
    ) -> Self {
        let samples = DirSamples::new(config.samples_dir(&paths));
        let coordinator = RenderCoordinator::new(Pipeline::new(config.extensions));
        Self {
            store,
            paths,
            config,
            samples,
            coordinator,
            ambient: Arc::new(SystemScheme),
        }
    }

    /// Replace the ambient color scheme used when no theme is stored.
    pub fn with_ambient(mut self, ambient: impl AmbientScheme + 'static) -> Self {
        self.ambient = Arc::new(ambient);
        self
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    pub async fn render(&self, source: String) -> Result<CmdResult> {
        commands::render::run(&self.coordinator, source).await
    }

    pub async fn save_document(&self, content: String) -> Result<CmdResult> {
        commands::document::save(self.store, content).await
    }

    pub async fn show_document(&self, html: bool) -> Result<CmdResult> {
        let coordinator = html.then_some(&self.coordinator);
        commands::document::show(self.store, &self.samples, coordinator).await
    }

    pub async fn load_sample(&self, name: &str) -> Result<CmdResult> {
        commands::document::load_sample(self.store, &self.samples, name).await
    }

    pub fn list_samples(&self) -> Result<CmdResult> {
        commands::document::list_samples(&self.samples)
    }

    /// `None` shows the theme; otherwise `toggle`, `light` or `dark`.
    pub async fn theme(&self, action: Option<&str>) -> Result<CmdResult> {
        let action = match action.map(str::trim) {
            None | Some("show") => ThemeAction::Show,
            Some("toggle") => ThemeAction::Toggle,
            Some(name) => ThemeAction::Set(name.parse::<Theme>()?),
        };
        commands::theme::run(self.store, Arc::clone(&self.ambient), action).await
    }

    /// Export to `output`, or into the current directory.
    pub async fn export(
        &self,
        title: Option<String>,
        output: Option<PathBuf>,
    ) -> Result<CmdResult> {
        let request = commands::export::ExportRequest {
            title,
            output: output.unwrap_or_else(|| PathBuf::from(".")),
        };
        commands::export::run(
            self.store,
            &self.samples,
            &self.coordinator,
            Arc::clone(&self.ambient),
            &self.config,
            request,
        )
        .await
    }

    pub fn config_command(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&self.paths, action)
    }
}
