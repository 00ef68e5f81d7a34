//! HTML element tree shared by the restructure, sanitize and serialize stages.

/// Elements that never have content or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Root(Vec<HtmlNode>),
    Element(Element),
    Text(String),
    /// Markup copied from the source verbatim. Must not reach the serializer.
    Raw(String),
}

impl HtmlNode {
    pub fn text(value: impl Into<String>) -> Self {
        HtmlNode::Text(value.into())
    }

    pub fn newline() -> Self {
        HtmlNode::Text("\n".to_string())
    }

    pub fn is_newline(&self) -> bool {
        matches!(self, HtmlNode::Text(t) if t == "\n")
    }

    pub fn children(&self) -> &[HtmlNode] {
        match self {
            HtmlNode::Root(children) => children.as_slice(),
            HtmlNode::Element(el) => el.children.as_slice(),
            HtmlNode::Text(_) | HtmlNode::Raw(_) => &[],
        }
    }

    /// Depth-first search for the first element with the given tag.
    pub fn find_element(&self, tag: &str) -> Option<&Element> {
        if let HtmlNode::Element(el) = self {
            if el.tag == tag {
                return Some(el);
            }
        }
        self.children().iter().find_map(|c| c.find_element(tag))
    }
}

impl From<Element> for HtmlNode {
    fn from(el: Element) -> Self {
        HtmlNode::Element(el)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    /// Boolean attribute, serialized bare (`checked`).
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<HtmlNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(Attribute {
            name: name.into(),
            value: AttrValue::Text(value.into()),
        });
        self
    }

    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.attrs.push(Attribute {
            name: name.into(),
            value: AttrValue::Flag,
        });
        self
    }

    pub fn child(mut self, node: impl Into<HtmlNode>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: Vec<HtmlNode>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let el = Element::new("input")
            .attr("type", "checkbox")
            .flag("disabled");
        assert_eq!(
            el.get_attr("type"),
            Some(&AttrValue::Text("checkbox".to_string()))
        );
        assert!(el.has_attr("disabled"));
        assert!(!el.has_attr("checked"));
        assert!(is_void(&el.tag));
    }

    #[test]
    fn test_find_element() {
        let tree = HtmlNode::Root(vec![Element::new("p")
            .child(Element::new("em").child(HtmlNode::text("x")))
            .into()]);
        assert_eq!(tree.find_element("em").unwrap().children.len(), 1);
        assert!(tree.find_element("strong").is_none());
    }
}
