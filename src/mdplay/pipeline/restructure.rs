//! Stage 2: markdown [`SyntaxTree`] to HTML element tree.
//!
//! The mapping is total. Raw HTML becomes [`HtmlNode::Raw`] and is left for
//! the sanitizer to judge; containers of unmodelled kinds become a `div`
//! around their converted children.

use super::html::{Element, HtmlNode};
use super::parse::{Align, MdKind, MdNode, SyntaxTree, MAX_DEPTH};
use super::sanitize::ID_PREFIX;
use crate::error::{PlaygroundError, Result};
use std::collections::HashMap;

pub fn to_html(tree: &SyntaxTree) -> Result<HtmlNode> {
    let mut labels = Vec::new();
    collect_footnote_labels(&tree.root, &mut labels);

    let mut restructurer = Restructurer {
        labels,
        references: HashMap::new(),
        definitions: Vec::new(),
    };
    let mut children = restructurer.blocks(&tree.root.children, 1, false)?;

    if !restructurer.definitions.is_empty() {
        if !children.is_empty() {
            children.push(HtmlNode::newline());
        }
        children.push(restructurer.footnote_section());
    }

    Ok(HtmlNode::Root(children))
}

fn collect_footnote_labels(node: &MdNode, labels: &mut Vec<String>) {
    if let MdKind::FootnoteDefinition { label } = &node.kind {
        if !labels.contains(label) {
            labels.push(label.clone());
        }
    }
    for child in &node.children {
        collect_footnote_labels(child, labels);
    }
}

/// Footnote ids are emitted bare; the sanitizer adds [`ID_PREFIX`], so
/// fragment links point at the prefixed form.
struct Restructurer {
    labels: Vec<String>,
    /// References seen so far per label.
    references: HashMap<String, usize>,
    definitions: Vec<(String, Vec<HtmlNode>)>,
}

impl Restructurer {
    fn node(&mut self, node: &MdNode, depth: usize) -> Result<Vec<HtmlNode>> {
        if depth > MAX_DEPTH + 8 {
            return Err(PlaygroundError::Render(format!(
                "document nesting exceeds {} levels",
                MAX_DEPTH
            )));
        }
        let children = &node.children;

        let out = match &node.kind {
            MdKind::Root => vec![HtmlNode::Root(self.blocks(children, depth, false)?)],
            MdKind::Paragraph => single(Element::new("p").children(self.inlines(children, depth)?)),
            MdKind::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                let mut el = Element::new(format!("h{}", (*level).clamp(1, 6)));
                if let Some(id) = id {
                    el = el.attr("id", id.as_str());
                }
                if !classes.is_empty() {
                    el = el.attr("class", classes.join(" "));
                }
                for (name, value) in attrs {
                    el = match value {
                        Some(value) => el.attr(name.as_str(), value.as_str()),
                        None => el.flag(name.as_str()),
                    };
                }
                single(el.children(self.inlines(children, depth)?))
            }
            MdKind::BlockQuote => {
                single(Element::new("blockquote").children(self.blocks(children, depth, true)?))
            }
            MdKind::CodeBlock { lang } => {
                let mut code = Element::new("code");
                if let Some(lang) = lang {
                    code = code.attr("class", format!("language-{}", lang));
                }
                let text = node.plain_text();
                if !text.is_empty() {
                    code = code.child(HtmlNode::Text(text));
                }
                single(Element::new("pre").child(code))
            }
            MdKind::HtmlBlock => {
                let raw: String = children
                    .iter()
                    .filter_map(|c| match &c.kind {
                        MdKind::Html(h) | MdKind::Text(h) => Some(h.as_str()),
                        _ => None,
                    })
                    .collect();
                vec![HtmlNode::Raw(raw)]
            }
            MdKind::List { start } => {
                let mut el = match start {
                    Some(n) => {
                        let el = Element::new("ol");
                        if *n != 1 {
                            el.attr("start", n.to_string())
                        } else {
                            el
                        }
                    }
                    None => Element::new("ul"),
                };
                let has_tasks = children
                    .iter()
                    .any(|c| matches!(c.kind, MdKind::ListItem { checked: Some(_) }));
                if has_tasks {
                    el = el.attr("class", "contains-task-list");
                }
                single(el.children(self.blocks(children, depth, true)?))
            }
            MdKind::ListItem { checked } => {
                let mut el = Element::new("li");
                if checked.is_some() {
                    el = el.attr("class", "task-list-item");
                }
                let content = if children.iter().any(|c| c.kind.is_block()) {
                    self.mixed(children, depth)?
                } else {
                    self.inlines(children, depth)?
                };
                single(el.children(content))
            }
            MdKind::TaskMarker(checked) => {
                let mut input = Element::new("input").attr("type", "checkbox");
                if *checked {
                    input = input.flag("checked");
                }
                vec![input.flag("disabled").into(), HtmlNode::text(" ")]
            }
            MdKind::Table { alignments } => single(self.table(children, alignments, depth)?),
            MdKind::TableHead => {
                let row = Element::new("tr").children(self.cells(node, &[], "th", depth)?);
                single(Element::new("thead").children(padded(vec![row.into()])))
            }
            MdKind::TableRow => {
                single(Element::new("tr").children(self.cells(node, &[], "td", depth)?))
            }
            MdKind::TableCell => {
                single(Element::new("td").children(self.inlines(children, depth)?))
            }
            MdKind::Emphasis => single(Element::new("em").children(self.inlines(children, depth)?)),
            MdKind::Strong => {
                single(Element::new("strong").children(self.inlines(children, depth)?))
            }
            MdKind::Strikethrough => {
                single(Element::new("del").children(self.inlines(children, depth)?))
            }
            MdKind::Link { url, title } => {
                let mut el = Element::new("a").attr("href", url.as_str());
                if let Some(title) = title {
                    el = el.attr("title", title.as_str());
                }
                single(el.children(self.inlines(children, depth)?))
            }
            MdKind::Image { url, title } => {
                let mut el = Element::new("img")
                    .attr("src", url.as_str())
                    .attr("alt", node.plain_text());
                if let Some(title) = title {
                    el = el.attr("title", title.as_str());
                }
                single(el)
            }
            MdKind::FootnoteDefinition { label } => {
                let content = self.blocks(children, depth, true)?;
                self.definitions.push((label.clone(), content));
                Vec::new()
            }
            MdKind::FootnoteReference { label } => {
                match self.labels.iter().position(|l| l == label) {
                    Some(index) => single(self.footnote_ref(label, index)),
                    None => vec![HtmlNode::text(format!("[^{}]", label))],
                }
            }
            MdKind::Text(text) => vec![HtmlNode::text(text.as_str())],
            MdKind::InlineCode(code) => {
                single(Element::new("code").child(HtmlNode::text(code.as_str())))
            }
            MdKind::Html(html) => vec![HtmlNode::Raw(html.clone())],
            MdKind::SoftBreak => vec![HtmlNode::newline()],
            MdKind::HardBreak => vec![Element::new("br").into(), HtmlNode::newline()],
            MdKind::ThematicBreak => single(Element::new("hr")),
            MdKind::Other => {
                if children.is_empty() {
                    Vec::new()
                } else {
                    single(Element::new("div").children(self.inlines(children, depth)?))
                }
            }
        };
        Ok(out)
    }

    fn inlines(&mut self, children: &[MdNode], depth: usize) -> Result<Vec<HtmlNode>> {
        let mut out = Vec::new();
        for child in children {
            out.extend(self.node(child, depth + 1)?);
        }
        Ok(out)
    }

    /// Block children separated by newlines, optionally padded inside the parent.
    fn blocks(&mut self, children: &[MdNode], depth: usize, pad: bool) -> Result<Vec<HtmlNode>> {
        let mut out = Vec::new();
        for child in children {
            let converted = self.node(child, depth + 1)?;
            if converted.is_empty() {
                continue;
            }
            if pad || !out.is_empty() {
                out.push(HtmlNode::newline());
            }
            out.extend(converted);
        }
        if pad && !out.is_empty() {
            out.push(HtmlNode::newline());
        }
        Ok(out)
    }

    /// Inline runs stay inline; each block child gets its own line.
    fn mixed(&mut self, children: &[MdNode], depth: usize) -> Result<Vec<HtmlNode>> {
        let mut out = Vec::new();
        let mut last_was_block = false;
        for child in children {
            let converted = self.node(child, depth + 1)?;
            if converted.is_empty() {
                continue;
            }
            let is_block = child.kind.is_block();
            if is_block || last_was_block {
                out.push(HtmlNode::newline());
            }
            out.extend(converted);
            last_was_block = is_block;
        }
        if last_was_block {
            out.push(HtmlNode::newline());
        }
        Ok(out)
    }

    fn table(
        &mut self,
        children: &[MdNode],
        alignments: &[Align],
        depth: usize,
    ) -> Result<Element> {
        let mut head = Vec::new();
        let mut rows = Vec::new();
        for child in children {
            match child.kind {
                MdKind::TableHead => {
                    let cells = self.cells(child, alignments, "th", depth + 1)?;
                    head.push(Element::new("tr").children(cells).into());
                }
                MdKind::TableRow => {
                    let cells = self.cells(child, alignments, "td", depth + 1)?;
                    rows.push(Element::new("tr").children(cells).into());
                }
                _ => rows.extend(self.node(child, depth + 1)?),
            }
        }

        let mut sections = Vec::new();
        if !head.is_empty() {
            sections.push(Element::new("thead").children(padded(head)).into());
        }
        if !rows.is_empty() {
            sections.push(Element::new("tbody").children(padded(rows)).into());
        }
        Ok(Element::new("table").children(padded(sections)))
    }

    /// Cells of a head or row. A head may wrap its cells in a row.
    fn cells(
        &mut self,
        row: &MdNode,
        alignments: &[Align],
        tag: &str,
        depth: usize,
    ) -> Result<Vec<HtmlNode>> {
        let mut cells = Vec::new();
        for child in &row.children {
            match child.kind {
                MdKind::TableCell => {
                    let mut cell = Element::new(tag);
                    if let Some(align) = alignments
                        .get(cells.len())
                        .and_then(|a| a.as_attr())
                    {
                        cell = cell.attr("align", align);
                    }
                    cells.push(cell.children(self.inlines(&child.children, depth + 1)?));
                }
                MdKind::TableRow => {
                    let nested = self.cells(child, alignments, tag, depth + 1)?;
                    return Ok(padded(nested));
                }
                _ => {}
            }
        }
        Ok(padded(cells.into_iter().map(HtmlNode::from).collect()))
    }

    /// The second and later references to a label get `-2`, `-3`, ... ids.
    fn footnote_ref(&mut self, label: &str, index: usize) -> Element {
        let seen = self.references.entry(label.to_string()).or_insert(0);
        *seen += 1;
        let id = match *seen {
            1 => format!("fnref-{}", label),
            n => format!("fnref-{}-{}", label, n),
        };
        Element::new("sup").child(
            Element::new("a")
                .attr("href", format!("#{}fn-{}", ID_PREFIX, label))
                .attr("id", id)
                .attr("class", "footnote-ref")
                .child(HtmlNode::text((index + 1).to_string())),
        )
    }

    fn footnote_section(&mut self) -> HtmlNode {
        let mut items = Vec::new();
        for (label, mut content) in self.definitions.drain(..) {
            let backref = Element::new("a")
                .attr("href", format!("#{}fnref-{}", ID_PREFIX, label))
                .attr("class", "footnote-backref")
                .child(HtmlNode::text("\u{21a9}"));
            if content.last().is_some_and(HtmlNode::is_newline) {
                content.pop();
            }
            content.push(HtmlNode::text(" "));
            content.push(backref.into());
            content.push(HtmlNode::newline());
            items.push(
                Element::new("li")
                    .attr("id", format!("fn-{}", label))
                    .children(content)
                    .into(),
            );
        }
        let list = Element::new("ol").children(padded(items));
        Element::new("section")
            .attr("class", "footnotes")
            .children(padded(vec![list.into()]))
            .into()
    }
}

fn single(el: Element) -> Vec<HtmlNode> {
    vec![el.into()]
}

/// Newline before, between and after each node.
fn padded(nodes: Vec<HtmlNode>) -> Vec<HtmlNode> {
    let mut out = Vec::with_capacity(nodes.len() * 2 + 1);
    for node in nodes {
        out.push(HtmlNode::newline());
        out.push(node);
    }
    if !out.is_empty() {
        out.push(HtmlNode::newline());
    }
    out
}
