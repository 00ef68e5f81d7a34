//! Stage 1: markdown source to [`SyntaxTree`].
//!
//! Built on the `pulldown-cmark` event stream, which already accepts any
//! input. Events and tags this module does not model are kept as generic
//! [`MdKind::Other`] containers so their content survives.

use crate::error::{PlaygroundError, Result};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use tracing::debug;

/// Containers nested deeper than this are flattened into the deepest one.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

impl From<Alignment> for Align {
    fn from(value: Alignment) -> Self {
        match value {
            Alignment::None => Align::None,
            Alignment::Left => Align::Left,
            Alignment::Center => Align::Center,
            Alignment::Right => Align::Right,
        }
    }
}

impl Align {
    pub fn as_attr(self) -> Option<&'static str> {
        match self {
            Align::None => None,
            Align::Left => Some("left"),
            Align::Center => Some("center"),
            Align::Right => Some("right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MdKind {
    Root,
    Paragraph,
    Heading {
        level: u8,
        id: Option<String>,
        classes: Vec<String>,
        attrs: Vec<(String, Option<String>)>,
    },
    BlockQuote,
    CodeBlock {
        lang: Option<String>,
    },
    HtmlBlock,
    List {
        start: Option<u64>,
    },
    ListItem {
        checked: Option<bool>,
    },
    TaskMarker(bool),
    Table {
        alignments: Vec<Align>,
    },
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link {
        url: String,
        title: Option<String>,
    },
    Image {
        url: String,
        title: Option<String>,
    },
    FootnoteDefinition {
        label: String,
    },
    FootnoteReference {
        label: String,
    },
    Text(String),
    InlineCode(String),
    Html(String),
    SoftBreak,
    HardBreak,
    ThematicBreak,
    /// A container of a kind this module does not model.
    Other,
}

impl MdKind {
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            MdKind::Paragraph
                | MdKind::Heading { .. }
                | MdKind::BlockQuote
                | MdKind::CodeBlock { .. }
                | MdKind::HtmlBlock
                | MdKind::List { .. }
                | MdKind::Table { .. }
                | MdKind::ThematicBreak
                | MdKind::FootnoteDefinition { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdNode {
    pub kind: MdKind,
    pub children: Vec<MdNode>,
}

impl MdNode {
    pub fn new(kind: MdKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Concatenated literal text of the subtree, breaks as spaces.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            MdKind::Text(t) | MdKind::InlineCode(t) => out.push_str(t),
            MdKind::SoftBreak | MdKind::HardBreak => out.push(' '),
            _ => {}
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// Parsed markdown, owned by a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    pub root: MdNode,
}

impl SyntaxTree {
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &MdNode) -> usize {
            1 + node.children.iter().map(depth_of).max().unwrap_or(0)
        }
        depth_of(&self.root)
    }
}

pub fn parse(source: &str, options: Options) -> Result<SyntaxTree> {
    let mut builder = TreeBuilder::new();

    for event in Parser::new_ext(source, options) {
        match event {
            Event::Start(tag) => builder.open(kind_for(tag)),
            Event::End(_) => builder.close()?,
            Event::Text(text) => builder.leaf(MdKind::Text(text.to_string())),
            Event::Code(code) => builder.leaf(MdKind::InlineCode(code.to_string())),
            Event::Html(html) | Event::InlineHtml(html) => {
                builder.leaf(MdKind::Html(html.to_string()))
            }
            Event::FootnoteReference(label) => builder.leaf(MdKind::FootnoteReference {
                label: label.to_string(),
            }),
            Event::SoftBreak => builder.leaf(MdKind::SoftBreak),
            Event::HardBreak => builder.leaf(MdKind::HardBreak),
            Event::Rule => builder.leaf(MdKind::ThematicBreak),
            Event::TaskListMarker(checked) => builder.task_marker(checked),
            other => debug!(event = ?other, "skipping unmodelled markdown event"),
        }
    }

    builder.finish()
}

fn kind_for(tag: Tag<'_>) -> MdKind {
    match tag {
        Tag::Paragraph => MdKind::Paragraph,
        Tag::Heading {
            level,
            id,
            classes,
            attrs,
        } => MdKind::Heading {
            level: heading_level(level),
            id: id.map(|id| id.to_string()),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            attrs: attrs
                .iter()
                .map(|(name, value)| (name.to_string(), value.as_ref().map(|v| v.to_string())))
                .collect(),
        },
        Tag::BlockQuote(_) => MdKind::BlockQuote,
        Tag::CodeBlock(kind) => MdKind::CodeBlock {
            lang: match kind {
                CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
                CodeBlockKind::Indented => None,
            },
        },
        Tag::HtmlBlock => MdKind::HtmlBlock,
        Tag::List(start) => MdKind::List { start },
        Tag::Item => MdKind::ListItem { checked: None },
        Tag::FootnoteDefinition(label) => MdKind::FootnoteDefinition {
            label: label.to_string(),
        },
        Tag::Table(alignments) => MdKind::Table {
            alignments: alignments.into_iter().map(Align::from).collect(),
        },
        Tag::TableHead => MdKind::TableHead,
        Tag::TableRow => MdKind::TableRow,
        Tag::TableCell => MdKind::TableCell,
        Tag::Emphasis => MdKind::Emphasis,
        Tag::Strong => MdKind::Strong,
        Tag::Strikethrough => MdKind::Strikethrough,
        Tag::Link {
            dest_url, title, ..
        } => MdKind::Link {
            url: dest_url.to_string(),
            title: non_empty(&title),
        },
        Tag::Image {
            dest_url, title, ..
        } => MdKind::Image {
            url: dest_url.to_string(),
            title: non_empty(&title),
        },
        _ => MdKind::Other,
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Stack-based tree assembly. The root sits at the bottom of the stack and is
/// only removed by `finish`.
struct TreeBuilder {
    stack: Vec<MdNode>,
    flattened: usize,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![MdNode::new(MdKind::Root)],
            flattened: 0,
        }
    }

    fn open(&mut self, kind: MdKind) {
        if self.stack.len() > MAX_DEPTH {
            self.flattened += 1;
            return;
        }
        self.stack.push(MdNode::new(kind));
    }

    fn close(&mut self) -> Result<()> {
        if self.flattened > 0 {
            self.flattened -= 1;
            return Ok(());
        }
        if self.stack.len() < 2 {
            return Err(PlaygroundError::Parse(
                "end event without a matching start".to_string(),
            ));
        }
        if let Some(node) = self.stack.pop() {
            self.leaf_node(node);
        }
        Ok(())
    }

    fn leaf(&mut self, kind: MdKind) {
        self.leaf_node(MdNode::new(kind));
    }

    fn leaf_node(&mut self, node: MdNode) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
        }
    }

    fn task_marker(&mut self, checked: bool) {
        if let Some(item) = self
            .stack
            .iter_mut()
            .rev()
            .find(|n| matches!(n.kind, MdKind::ListItem { .. }))
        {
            item.kind = MdKind::ListItem {
                checked: Some(checked),
            };
        }
        self.leaf(MdKind::TaskMarker(checked));
    }

    fn finish(mut self) -> Result<SyntaxTree> {
        if self.stack.len() != 1 {
            return Err(PlaygroundError::Parse(format!(
                "{} unterminated container(s)",
                self.stack.len() - 1
            )));
        }
        match self.stack.pop() {
            Some(root) => Ok(SyntaxTree { root }),
            None => Err(PlaygroundError::Parse("missing root".to_string())),
        }
    }
}
