//! # Parser - Building an Element Tree
//!
//! Consumes the flat token stream from the [lexer](crate::lexer) and builds
//! a forest of [`Node`]s using a stack of open elements, much like a browser
//! does for a fragment, but with only the handful of recovery rules page
//! content actually needs:
//!
//! - void elements (`img`, `br`, ...) and `<x/>` never open a scope
//! - a block-level start tag closes an open `<p>`
//! - `<li>` closes a previous `<li>` in the same list
//! - an end tag closes everything up to its matching open element
//! - an end tag with no matching open element is dropped
//! - elements still open at end of input are closed there
//!
//! Comments are kept, declarations and processing instructions are dropped.

use crate::MarkupError;
use crate::lexer::{TokenKind, lex};
use crate::node::{Attribute, Element, Node, Text, is_phrasing_element};

/// Parse a markup fragment into a forest of nodes.
pub fn parse_fragment(input: &str) -> Result<Vec<Node>, MarkupError> {
    let tokens = lex(input)?;
    let mut builder = TreeBuilder::new();

    for token in &tokens {
        match token.kind {
            TokenKind::Text | TokenKind::Lt => builder.text(token.text),
            TokenKind::Comment => builder.comment(token.text),
            TokenKind::StartTag => builder.start_tag(StartTag::parse(token.text)),
            TokenKind::EndTag => builder.end_tag(&end_tag_name(token.text)),
            TokenKind::Declaration | TokenKind::ProcessingInstruction => {}
        }
    }

    Ok(builder.finish())
}

struct TreeBuilder {
    open: Vec<Element>,
    out: Vec<Node>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            open: Vec::new(),
            out: Vec::new(),
        }
    }

    fn children(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some(element) => &mut element.children,
            None => &mut self.out,
        }
    }

    fn append(&mut self, node: Node) {
        self.children().push(node);
    }

    fn text(&mut self, raw: &str) {
        let children = self.children();
        if let Some(Node::Text(previous)) = children.last_mut() {
            previous.push_raw(raw);
        } else {
            children.push(Node::Text(Text::new(raw)));
        }
    }

    fn comment(&mut self, token: &str) {
        let body = token
            .strip_prefix("<!--")
            .and_then(|rest| rest.strip_suffix("-->"))
            .unwrap_or_default();
        self.append(Node::Comment(body.to_string()));
    }

    fn start_tag(&mut self, tag: StartTag) {
        self.close_implied(&tag.name);

        let element = Element {
            name: tag.name,
            attributes: tag.attributes,
            children: Vec::new(),
        };

        if tag.self_closing || element.is_void() {
            self.append(Node::Element(element));
        } else {
            self.open.push(element);
        }
    }

    fn end_tag(&mut self, name: &str) {
        let Some(depth) = self.open.iter().rposition(|e| e.name == name) else {
            return;
        };
        while self.open.len() > depth {
            self.close_current();
        }
    }

    fn close_current(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
    }

    fn close_implied(&mut self, incoming: &str) {
        if !is_phrasing_element(incoming)
            && self.open.last().is_some_and(|e| e.name == "p")
        {
            self.close_current();
        }

        if incoming == "li" {
            let list = self
                .open
                .iter()
                .rposition(|e| e.name == "ul" || e.name == "ol");
            let item = self.open.iter().rposition(|e| e.name == "li");
            if let Some(item) = item
                && list.is_none_or(|list| item > list)
            {
                while self.open.len() > item {
                    self.close_current();
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.open.is_empty() {
            self.close_current();
        }
        self.out
    }
}

/// The parts of a start tag token.
#[derive(Debug, PartialEq, Eq)]
struct StartTag {
    name: String,
    attributes: Vec<Attribute>,
    self_closing: bool,
}

impl StartTag {
    /// Parse `<name a="1" b='2' c=3 d />`. The token is known to start with
    /// `<` + a letter and end with `>`.
    fn parse(token: &str) -> Self {
        let inner = token
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .unwrap_or(token);
        let name_end = inner
            .find(|c: char| c.is_ascii_whitespace() || c == '/')
            .unwrap_or(inner.len());
        let name = inner[..name_end].to_ascii_lowercase();
        let rest = &inner[name_end..];
        let self_closing = rest.trim_end().ends_with('/');

        Self {
            name,
            attributes: parse_attributes(rest),
            self_closing,
        }
    }
}

fn parse_attributes(mut rest: &str) -> Vec<Attribute> {
    let mut attributes = Vec::new();

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }

        let name_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start_matches(|c: char| c.is_ascii_whitespace());

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start_matches(|c: char| c.is_ascii_whitespace());
            let (raw, remaining) = split_value(after_eq);
            rest = remaining;
            Some(html_escape::decode_html_entities(raw).into_owned())
        } else {
            None
        };

        if !name.is_empty() {
            attributes.push(Attribute { name, value });
        }
    }

    attributes
}

/// Split an attribute value off the front of `s`, returning the value
/// without quotes and the remaining input.
fn split_value(s: &str) -> (&str, &str) {
    match s.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let body = &s[1..];
            match body.find(q) {
                Some(end) => (&body[..end], &body[end + 1..]),
                None => (body, ""),
            }
        }
        _ => {
            let end = s
                .find(|c: char| c.is_ascii_whitespace())
                .unwrap_or(s.len());
            (&s[..end], &s[end..])
        }
    }
}

fn end_tag_name(token: &str) -> String {
    token
        .trim_start_matches("</")
        .trim_end_matches('>')
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn serialise(nodes: &[Node]) -> String {
        nodes.iter().map(Node::to_html).collect()
    }

    #[rstest]
    #[case("<p>Hello</p>")]
    #[case("<h2>Title</h2><p>Body</p>")]
    #[case("<ul><li>One</li><li>Two</li></ul>")]
    #[case(r#"<p><img src="a.png" alt="A"></p>"#)]
    #[case("<table><tr><td>1</td></tr></table>")]
    #[case("<p>Fish &amp; chips</p>")]
    fn well_formed_fragments_serialise_back(#[case] input: &str) {
        assert_eq!(serialise(&parse_fragment(input).unwrap()), input);
    }

    #[test]
    fn start_tag_attributes() {
        let tag = StartTag::parse(r#"<IMG Src="a.png" alt='An &amp; B' width=20 hidden/>"#);
        assert_eq!(tag.name, "img");
        assert!(tag.self_closing);
        assert_eq!(
            tag.attributes,
            vec![
                Attribute {
                    name: "src".to_string(),
                    value: Some("a.png".to_string())
                },
                Attribute {
                    name: "alt".to_string(),
                    value: Some("An & B".to_string())
                },
                Attribute {
                    name: "width".to_string(),
                    value: Some("20".to_string())
                },
                Attribute {
                    name: "hidden".to_string(),
                    value: None
                },
            ]
        );
    }

    #[test]
    fn unclosed_paragraphs_close_each_other() {
        let nodes = parse_fragment("<p>one<p>two").unwrap();
        assert_eq!(serialise(&nodes), "<p>one</p><p>two</p>");
    }

    #[test]
    fn block_start_closes_paragraph_but_inline_does_not() {
        let nodes = parse_fragment("<p>a <b>bold</b><div>x</div>").unwrap();
        assert_eq!(serialise(&nodes), "<p>a <b>bold</b></p><div>x</div>");
    }

    #[rstest]
    #[case(r#"<p>See the <img src="map.png" alt="map"> below</p>"#)]
    #[case(r#"<p>Name <input name="n"> <button>Go</button></p>"#)]
    #[case(r#"<p><video src="tour.mp4"></video> and <iframe src="x"></iframe></p>"#)]
    fn embedded_content_stays_in_paragraph(#[case] input: &str) {
        let nodes = parse_fragment(input).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(serialise(&nodes), input);
    }

    #[test]
    fn list_items_close_siblings_not_nested_lists() {
        let nodes = parse_fragment("<ul><li>a<ul><li>b</ul><li>c</ul>").unwrap();
        assert_eq!(
            serialise(&nodes),
            "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>"
        );
    }

    #[test]
    fn stray_end_tags_are_dropped() {
        let nodes = parse_fragment("</div>text</span>").unwrap();
        assert_eq!(serialise(&nodes), "text");
    }

    #[test]
    fn end_tag_closes_intervening_elements() {
        let nodes = parse_fragment("<div><span>x</div>after").unwrap();
        assert_eq!(serialise(&nodes), "<div><span>x</span></div>after");
    }

    #[test]
    fn doctype_dropped_comment_kept() {
        let nodes = parse_fragment("<!DOCTYPE html><!--c--><p>x</p>").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], Node::Comment("c".to_string()));
    }

    #[test]
    fn truncated_tag_is_malformed() {
        assert_eq!(
            parse_fragment("<p>ok</p><img src=\"x"),
            Err(MarkupError::UnterminatedTag { offset: 9 })
        );
    }

    #[test]
    fn tree_shape() {
        let nodes = parse_fragment("<div class=\"box\"><p>A</p>\n<p>B</p></div>").unwrap();
        let dump = dump(&nodes, 0);
        insta::assert_snapshot!(dump, @r#"
        div [class="box"]
          p
            text "A"
          text "\n"
          p
            text "B"
        "#);
    }

    fn dump(nodes: &[Node], depth: usize) -> String {
        let mut out = String::new();
        let pad = "  ".repeat(depth);
        for node in nodes {
            match node {
                Node::Element(e) => {
                    out.push_str(&pad);
                    out.push_str(&e.name);
                    if !e.attributes.is_empty() {
                        let attrs: Vec<String> = e
                            .attributes
                            .iter()
                            .map(|a| format!("{}={:?}", a.name, a.value.as_deref().unwrap_or("")))
                            .collect();
                        out.push_str(&format!(" [{}]", attrs.join(" ")));
                    }
                    out.push('\n');
                    out.push_str(&dump(&e.children, depth + 1));
                }
                Node::Text(t) => out.push_str(&format!("{pad}text {:?}\n", t.raw())),
                Node::Comment(c) => out.push_str(&format!("{pad}comment {c:?}\n")),
            }
        }
        out
    }
}
