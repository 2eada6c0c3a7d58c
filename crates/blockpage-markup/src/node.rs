//! Element tree produced by [`parse_fragment`](crate::parse_fragment).

use std::borrow::Cow;

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements that flow inside a paragraph.
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "del", "dfn", "em", "font", "i",
    "ins", "kbd", "mark", "q", "s", "samp", "small", "span", "strike", "strong", "sub", "sup",
    "time", "u", "var", "wbr",
];

/// Embedded and form content that may sit inside a paragraph but is not
/// text formatting.
const EMBEDDED_PHRASING: &[&str] = &[
    "audio", "button", "canvas", "embed", "iframe", "img", "input", "label", "map", "math",
    "meter", "object", "output", "picture", "progress", "select", "svg", "textarea", "video",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn is_inline_element(name: &str) -> bool {
    INLINE_ELEMENTS.contains(&name)
}

/// Whether an element may appear inside an open `<p>` without closing it.
pub fn is_phrasing_element(name: &str) -> bool {
    is_inline_element(name) || EMBEDDED_PHRASING.contains(&name)
}

/// A node in the parsed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(Text),
    Comment(String),
}

/// An element with lowercased name, decoded attributes and child nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Decoded value; `None` for bare attributes such as `disabled`.
    pub value: Option<String>,
}

/// Character data, kept exactly as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    raw: String,
}

impl Text {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Source text with entities left encoded
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Text with entities decoded
    pub fn decoded(&self) -> Cow<'_, str> {
        html_escape::decode_html_entities(&self.raw)
    }

    pub(crate) fn push_raw(&mut self, more: &str) {
        self.raw.push_str(more);
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Whether this node contributes nothing visible: a comment or
    /// whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Node::Text(text) => text.decoded().trim().is_empty(),
            Node::Comment(_) => true,
            Node::Element(_) => false,
        }
    }

    /// Concatenated decoded text of this node and its descendants, the way
    /// a DOM `textContent` reads.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&text.decoded()),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Node::Comment(_) => {}
        }
    }

    /// Serialise this node back to markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text.raw()),
            Node::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            Node::Element(element) => element.write_html(out),
        }
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Decoded value of the named attribute
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
    }

    pub fn is_void(&self) -> bool {
        is_void_element(&self.name)
    }

    pub fn is_inline(&self) -> bool {
        is_inline_element(&self.name)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(Node::text_content).collect()
    }

    /// Markup of the children only.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for attribute in &self.attributes {
            out.push(' ');
            out.push_str(&attribute.name);
            if let Some(value) = &attribute.value {
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(value));
                out.push('"');
            }
        }
        out.push('>');
        if self.is_void() {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}
