//! The markdown to sanitized HTML pipeline.
//!
//! Four stages, each a plain function over owned trees:
//!
//! 1. [`parse`]: source text to [`SyntaxTree`]
//! 2. [`restructure`]: syntax tree to [`HtmlNode`] tree
//! 3. [`sanitize`]: allow-list filtering against a [`Schema`]
//! 4. [`serialize`]: tree to markup
//!
//! The serialized markup then goes through [`Schema::clean`], the ammonia
//! pass that enforces the schema on what is actually emitted.
//!
//! [`Pipeline::render`] never fails. Any stage error, or a panic inside one,
//! is logged and replaced by [`ERROR_MARKER`].

pub mod html;
pub mod parse;
pub mod restructure;
pub mod sanitize;
pub mod serialize;

pub use html::HtmlNode;
pub use parse::SyntaxTree;
pub use sanitize::Schema;

use crate::error::{PlaygroundError, Result};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error};

/// Shown in place of the preview when rendering fails.
pub const ERROR_MARKER: &str = "<p>Error parsing markdown</p>";

/// Markdown extensions on top of CommonMark. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub footnotes: bool,
    /// `# Title {#id .class}` syntax.
    pub heading_attributes: bool,
}

impl PipelineOptions {
    pub fn to_cmark(self) -> pulldown_cmark::Options {
        use pulldown_cmark::Options;

        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, self.tasklists);
        options.set(Options::ENABLE_FOOTNOTES, self.footnotes);
        options.set(Options::ENABLE_HEADING_ATTRIBUTES, self.heading_attributes);
        options
    }
}

/// Anything that turns source text into displayable markup without failing.
pub trait Render: Send + Sync + 'static {
    fn render(&self, source: &str) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: PipelineOptions,
    schema: Schema,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            schema: Schema::default(),
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Run all four stages, surfacing the first stage error.
    pub fn try_render(&self, source: &str) -> Result<String> {
        let tree = parse::parse(source, self.options.to_cmark())?;
        debug!(depth = tree.depth(), "parsed source");
        let html = restructure::to_html(&tree)?;
        let shaped = sanitize::sanitize(html, &self.schema);
        let markup = serialize::to_string(&shaped)?;
        Ok(self.schema.clean(&markup))
    }
}

impl Render for Pipeline {
    fn render(&self, source: &str) -> String {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_render(source)))
            .unwrap_or_else(|_| Err(PlaygroundError::Render("pipeline panicked".to_string())));
        match outcome {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "render failed");
                ERROR_MARKER.to_string()
            }
        }
    }
}
