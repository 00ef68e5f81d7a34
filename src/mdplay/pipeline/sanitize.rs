//! Stage 3: allow-list sanitizing.
//!
//! Two passes share one [`Schema`]. [`sanitize`] shapes the element tree:
//! raw markup is dropped, elements outside the schema are unwrapped (their
//! children are kept) and the strip set goes with its content. After
//! serialization, [`Schema::clean`] runs the markup through an
//! `ammonia::Builder` built from the same schema, which enforces tags,
//! attributes, URL schemes, class tokens and the id prefix.

use super::html::{AttrValue, Attribute, Element, HtmlNode};
use ammonia::{Builder, UrlRelative};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Prepended to every `id` so user content cannot clobber page ids.
pub const ID_PREFIX: &str = "user-content-";

const DEFAULT_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "dd", "del", "details", "div", "dl", "dt", "em", "h1",
    "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "input", "ins", "kbd", "li", "ol", "p", "pre",
    "q", "rp", "rt", "ruby", "s", "samp", "section", "strike", "strong", "sub", "summary", "sup",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "tt", "ul", "var",
];

const DEFAULT_STRIP: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "template", "noscript", "textarea", "title",
    "xmp", "plaintext", "noembed", "noframes", "math", "svg",
];

const GENERIC_ATTRIBUTES: &[&str] = &[
    "abbr", "accept", "accept-charset", "accesskey", "align", "alt", "aria-describedby",
    "aria-hidden", "aria-label", "axis", "border", "cellpadding", "cellspacing", "char",
    "charoff", "charset", "clear", "cols", "colspan", "color", "compact", "coords", "datetime",
    "dir", "headers", "height", "hreflang", "hspace", "id", "ismap", "itemprop", "label", "lang",
    "maxlength", "media", "multiple", "nohref", "noshade", "nowrap", "open", "prompt",
    "readonly", "rows", "rowspan", "rules", "scope", "selected", "shape", "size", "span",
    "start", "summary", "tabindex", "title", "usemap", "valign", "value", "vspace", "width",
];

/// URL-valued attributes are limited to the ones ammonia scheme-checks.
const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href"]),
    ("code", &["class"]),
    ("img", &["src"]),
    ("input", &["checked", "disabled"]),
];

const ALLOWED_CLASSES: &[(&str, &[&str])] = &[
    ("a", &["footnote-ref", "footnote-backref"]),
    ("li", &["task-list-item"]),
    ("ol", &["contains-task-list"]),
    ("section", &["footnotes"]),
    ("ul", &["contains-task-list"]),
];

const URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Only `language-*` tokens survive on `code`.
const LANGUAGE_CLASS: &str = "language-";

/// The allow-list shared by [`sanitize`] and [`Schema::clean`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub tags: HashSet<String>,
    /// Removed together with their content.
    pub clean_content_tags: HashSet<String>,
    pub tag_attributes: HashMap<String, HashSet<String>>,
    pub generic_attributes: HashSet<String>,
    /// Absolute URLs must use one of these; relative URLs pass.
    pub url_schemes: HashSet<String>,
    /// Class tokens allowed per tag. Tags listed here take `class` from
    /// nowhere else.
    pub allowed_classes: HashMap<String, HashSet<String>>,
    pub id_prefix: String,
}

fn owned(values: &[&str]) -> HashSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn owned_map(entries: &[(&str, &[&str])]) -> HashMap<String, HashSet<String>> {
    entries
        .iter()
        .map(|(tag, values)| (tag.to_string(), owned(values)))
        .collect()
}

fn borrowed(values: &HashSet<String>) -> HashSet<&str> {
    values.iter().map(String::as_str).collect()
}

fn borrowed_map(map: &HashMap<String, HashSet<String>>) -> HashMap<&str, HashSet<&str>> {
    map.iter()
        .map(|(tag, values)| (tag.as_str(), borrowed(values)))
        .collect()
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            tags: owned(DEFAULT_TAGS),
            clean_content_tags: owned(DEFAULT_STRIP),
            tag_attributes: owned_map(TAG_ATTRIBUTES),
            generic_attributes: owned(GENERIC_ATTRIBUTES),
            url_schemes: owned(URL_SCHEMES),
            allowed_classes: owned_map(ALLOWED_CLASSES),
            id_prefix: ID_PREFIX.to_string(),
        }
    }
}

impl Schema {
    /// The enforcing sanitizer for this schema.
    ///
    /// Every `input` comes out as `type="checkbox"`.
    pub fn builder(&self) -> Builder<'_> {
        let mut builder = Builder::empty();
        builder
            .tags(borrowed(&self.tags))
            .clean_content_tags(borrowed(&self.clean_content_tags))
            .tag_attributes(borrowed_map(&self.tag_attributes))
            .generic_attributes(borrowed(&self.generic_attributes))
            .allowed_classes(borrowed_map(&self.allowed_classes))
            .url_schemes(borrowed(&self.url_schemes))
            .url_relative(UrlRelative::PassThrough)
            .link_rel(None)
            .strip_comments(true)
            .id_prefix(Some(self.id_prefix.as_str()))
            .set_tag_attribute_value("input", "type", "checkbox")
            .attribute_filter(language_classes);
        builder
    }

    /// Sanitize serialized markup against this schema.
    pub fn clean(&self, html: &str) -> String {
        self.builder().clean(html).to_string()
    }

    fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    fn strips_tag(&self, tag: &str) -> bool {
        self.clean_content_tags.contains(tag)
    }
}

fn language_classes<'u>(element: &str, attribute: &str, value: &'u str) -> Option<Cow<'u, str>> {
    if element != "code" || attribute != "class" {
        return Some(Cow::Borrowed(value));
    }
    let kept: Vec<&str> = value
        .split_ascii_whitespace()
        .filter(|token| token.len() > LANGUAGE_CLASS.len() && token.starts_with(LANGUAGE_CLASS))
        .collect();
    (!kept.is_empty()).then(|| Cow::Owned(kept.join(" ")))
}

/// Shape `tree` to the schema's tags. Total: never fails, only removes.
///
/// Attribute values are left to [`Schema::clean`].
pub fn sanitize(tree: HtmlNode, schema: &Schema) -> HtmlNode {
    let children = match tree {
        HtmlNode::Root(children) => children,
        other => vec![other],
    };
    let mut children = collapse_newlines(sanitize_children(children, schema));
    if children.last().is_some_and(HtmlNode::is_newline) {
        children.pop();
    }
    if children.first().is_some_and(HtmlNode::is_newline) {
        children.remove(0);
    }
    HtmlNode::Root(children)
}

fn sanitize_children(children: Vec<HtmlNode>, schema: &Schema) -> Vec<HtmlNode> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        sanitize_node(child, schema, &mut out);
    }
    out
}

fn sanitize_node(node: HtmlNode, schema: &Schema, out: &mut Vec<HtmlNode>) {
    match node {
        HtmlNode::Text(text) => out.push(HtmlNode::Text(text)),
        HtmlNode::Raw(raw) => trace!(len = raw.len(), "dropping raw markup"),
        HtmlNode::Root(children) => out.extend(sanitize_children(children, schema)),
        HtmlNode::Element(el) => {
            let tag = el.tag.to_ascii_lowercase();
            if schema.strips_tag(&tag) {
                trace!(tag = %tag, "stripping element and content");
                return;
            }
            if !schema.allows_tag(&tag) {
                trace!(tag = %tag, "unwrapping element");
                out.extend(sanitize_children(el.children, schema));
                return;
            }
            if let Some(kept) = sanitize_element(tag, el, schema) {
                out.push(kept.into());
            }
        }
    }
}

fn sanitize_element(tag: String, el: Element, schema: &Schema) -> Option<Element> {
    let mut attrs = el.attrs;
    if tag == "input" {
        let is_checkbox = attrs.iter().any(|a| {
            a.name.eq_ignore_ascii_case("type")
                && matches!(&a.value, AttrValue::Text(t) if t.eq_ignore_ascii_case("checkbox"))
        });
        if !is_checkbox {
            return None;
        }
        if !attrs.iter().any(|a| a.name.eq_ignore_ascii_case("disabled")) {
            attrs.push(Attribute {
                name: "disabled".to_string(),
                value: AttrValue::Flag,
            });
        }
    }

    let mut children = sanitize_children(el.children, schema);
    if tag != "pre" && tag != "code" {
        children = collapse_newlines(children);
        if children.iter().all(HtmlNode::is_newline) {
            children.clear();
        }
    }
    Some(Element {
        tag,
        attrs,
        children,
    })
}

/// Removals leave runs of block separators behind; keep one per run.
fn collapse_newlines(nodes: Vec<HtmlNode>) -> Vec<HtmlNode> {
    let mut out: Vec<HtmlNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if node.is_newline() && out.last().is_some_and(HtmlNode::is_newline) {
            continue;
        }
        out.push(node);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(node: HtmlNode) -> HtmlNode {
        sanitize(HtmlNode::Root(vec![node]), &Schema::default())
    }

    fn clean(html: &str) -> String {
        Schema::default().clean(html)
    }

    #[test]
    fn test_raw_markup_is_dropped() {
        let tree = HtmlNode::Root(vec![
            Element::new("h1").child(HtmlNode::text("Hi")).into(),
            HtmlNode::newline(),
            HtmlNode::Raw("<script>alert(1)</script>".to_string()),
            HtmlNode::newline(),
            Element::new("p").child(HtmlNode::text("x")).into(),
        ]);
        let cleaned = sanitize(tree, &Schema::default());
        assert_eq!(cleaned.children().len(), 3);
        assert!(cleaned.children()[1].is_newline());
    }

    #[test]
    fn test_strip_set_drops_content() {
        let tree = shape(
            Element::new("div")
                .child(Element::new("script").child(HtmlNode::text("alert(1)")))
                .child(HtmlNode::text("ok"))
                .into(),
        );
        let div = tree.find_element("div").unwrap();
        assert_eq!(div.children, vec![HtmlNode::text("ok")]);
    }

    #[test]
    fn test_unknown_element_is_unwrapped() {
        let tree = shape(
            Element::new("marquee")
                .child(Element::new("em").child(HtmlNode::text("x")))
                .into(),
        );
        assert!(tree.find_element("marquee").is_none());
        assert!(tree.find_element("em").is_some());
    }

    #[test]
    fn test_separator_runs_collapse_inside_containers() {
        let tree = shape(
            Element::new("blockquote")
                .child(HtmlNode::newline())
                .child(HtmlNode::Raw("<div>x</div>".to_string()))
                .child(HtmlNode::newline())
                .into(),
        );
        assert!(tree.find_element("blockquote").unwrap().children.is_empty());

        let tree = shape(
            Element::new("li")
                .child(HtmlNode::newline())
                .child(Element::new("p").child(HtmlNode::text("a")))
                .child(HtmlNode::newline())
                .child(HtmlNode::Raw("<hr onclick=x>".to_string()))
                .child(HtmlNode::newline())
                .into(),
        );
        let li = tree.find_element("li").unwrap();
        assert_eq!(li.children.len(), 3);
        assert!(li.children[0].is_newline());
        assert!(li.children[2].is_newline());
    }

    #[test]
    fn test_code_newlines_are_untouched() {
        let tree = shape(
            Element::new("pre")
                .child(Element::new("code").child(HtmlNode::newline()))
                .into(),
        );
        let code = tree.find_element("code").unwrap();
        assert_eq!(code.children, vec![HtmlNode::newline()]);
    }

    #[test]
    fn test_only_checkboxes_survive_shaping() {
        let tree = shape(Element::new("input").attr("type", "text").into());
        assert!(tree.find_element("input").is_none());

        let tree = shape(
            Element::new("input")
                .attr("type", "checkbox")
                .flag("checked")
                .into(),
        );
        let input = tree.find_element("input").unwrap();
        assert!(input.has_attr("checked"));
        assert!(input.has_attr("disabled"));
    }

    #[test]
    fn test_event_handlers_and_styles_removed() {
        let html = clean("<h1 onclick=\"alert(1)\" STYLE=\"color:red\" title=\"t\">x</h1>");
        assert_eq!(html, "<h1 title=\"t\">x</h1>");
    }

    #[test]
    fn test_dangerous_urls_removed() {
        for href in [
            "javascript:alert(1)",
            "JaVaScRiPt:alert(1)",
            " java\tscript:alert(1)",
            "&#106;avascript:alert(1)",
            "javascript&colon;alert(1)",
            "vbscript:msgbox",
            "data:text/html,&lt;b&gt;",
        ] {
            let html = clean(&format!("<a href=\"{}\">x</a>", href));
            assert_eq!(html, "<a>x</a>", "{}", href);
        }
        let html = clean("<img src=\"data:image/png;base64,xx\" alt=\"i\">");
        assert!(!html.contains("src="));
    }

    #[test]
    fn test_safe_urls_kept() {
        for href in [
            "https://example.com",
            "mailto:me@example.com",
            "/relative/path",
            "#anchor",
            "page?q=a:b",
        ] {
            let html = clean(&format!("<a href=\"{}\">x</a>", href));
            assert!(html.contains("href="), "{}", href);
        }
        assert_eq!(clean("<a href=\"ftp://example.com\">x</a>"), "<a>x</a>");
    }

    #[test]
    fn test_ids_get_prefix() {
        let html = clean("<h2 id=\"intro\">x</h2>");
        assert_eq!(html, "<h2 id=\"user-content-intro\">x</h2>");
    }

    #[test]
    fn test_class_tokens_filtered() {
        let html = clean("<code class=\"language-rust evil\">x</code>");
        assert_eq!(html, "<code class=\"language-rust\">x</code>");
        assert_eq!(clean("<code class=\"language-\">x</code>"), "<code>x</code>");
        assert_eq!(clean("<p class=\"x\">y</p>"), "<p>y</p>");
        assert_eq!(
            clean("<li class=\"task-list-item evil\">y</li>"),
            "<li class=\"task-list-item\">y</li>"
        );
    }

    #[test]
    fn test_inputs_are_forced_to_checkboxes() {
        let html = clean("<input type=\"text\" value=\"v\">");
        assert!(html.contains("type=\"checkbox\""));
        assert!(!html.contains("text"));
    }

    #[test]
    fn test_strip_set_removed_with_content() {
        let html = clean("<p>a<script>alert(1)</script><svg><g>b</g></svg></p><iframe>c</iframe>");
        assert_eq!(html, "<p>a</p>");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean("<p onclick=\"x\"><a href=\"javascript:x\">y</a><!-- c --></p>");
        assert_eq!(once, "<p><a>y</a></p>");
        assert_eq!(clean(&once), once);
    }
}
