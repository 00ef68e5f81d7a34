//! Stage 4: HTML tree to markup string.

use super::html::{is_void, AttrValue, Element, HtmlNode};
use crate::error::{PlaygroundError, Result};
use std::fmt::Write;

pub fn to_string(tree: &HtmlNode) -> Result<String> {
    let mut out = String::new();
    write_node(tree, &mut out)?;
    Ok(out)
}

fn write_node(node: &HtmlNode, out: &mut String) -> Result<()> {
    match node {
        HtmlNode::Root(children) => {
            for child in children {
                write_node(child, out)?;
            }
        }
        HtmlNode::Text(text) => escape_into(text, false, out),
        HtmlNode::Element(el) => write_element(el, out)?,
        HtmlNode::Raw(_) => {
            return Err(PlaygroundError::Render(
                "unsanitized markup reached the serializer".to_string(),
            ))
        }
    }
    Ok(())
}

fn write_element(el: &Element, out: &mut String) -> Result<()> {
    if !valid_name(&el.tag) {
        return Err(PlaygroundError::Render(format!("invalid tag name '{}'", el.tag)));
    }
    out.push('<');
    out.push_str(&el.tag);
    for attr in &el.attrs {
        if !valid_name(&attr.name) {
            return Err(PlaygroundError::Render(format!(
                "invalid attribute name '{}'",
                attr.name
            )));
        }
        match &attr.value {
            AttrValue::Flag => {
                let _ = write!(out, " {}", attr.name);
            }
            AttrValue::Text(value) => {
                let _ = write!(out, " {}=\"", attr.name);
                escape_into(value, true, out);
                out.push('"');
            }
        }
    }
    out.push('>');

    if is_void(&el.tag) {
        return Ok(());
    }
    for child in &el.children {
        write_node(child, out)?;
    }
    let _ = write!(out, "</{}>", el.tag);
    Ok(())
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
