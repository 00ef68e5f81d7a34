use crate::config::PlaygroundConfig;
use crate::error::Result;
use crate::model::Theme;
use crate::render::Rendered;
use crate::session::Origin;
use std::path::PathBuf;

pub mod config;
pub mod document;
pub mod export;
pub mod render;
pub mod theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub document: Option<String>,
    pub origin: Option<Origin>,
    pub rendered: Option<Rendered>,
    pub theme: Option<Theme>,
    pub samples: Vec<String>,
    pub written: Option<PathBuf>,
    pub config: Option<PlaygroundConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_document(mut self, content: impl Into<String>, origin: Origin) -> Self {
        self.document = Some(content.into());
        self.origin = Some(origin);
        self
    }

    pub fn with_rendered(mut self, rendered: Rendered) -> Self {
        self.rendered = Some(rendered);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn with_samples(mut self, samples: Vec<String>) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_written(mut self, path: PathBuf) -> Self {
        self.written = Some(path);
        self
    }

    pub fn with_config(mut self, config: PlaygroundConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Keep going after a store failure, noting it as a warning.
    ///
    /// Any other error is returned.
    pub fn tolerate(&mut self, outcome: Result<()>, what: &str) -> Result<()> {
        match outcome {
            Err(e) if e.is_store_failure() => {
                self.add_message(CmdMessage::warning(format!("{} not saved: {}", what, e)));
                Ok(())
            }
            other => other,
        }
    }
}
