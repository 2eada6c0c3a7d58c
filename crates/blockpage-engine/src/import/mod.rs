//! # Import
//!
//! Turns a pasted markup fragment into root blocks. Paragraph-level content
//! is gathered into a buffer and emitted as one `text` block; headings,
//! lists, images, tables and blockquotes each close the buffer and become
//! their own block. Unrecognised containers are walked into so their
//! content is kept.
//!
//! Markdown goes through `pulldown-cmark` first and then takes the same
//! path.

use log::{debug, warn};
use pulldown_cmark::{Options, Parser, html};
use serde_json::{Value, json};

use blockpage_markup::{Element, MarkupError, Node, parse_fragment};

use crate::models::Block;
use crate::registry::BlockTypeRegistry;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// The fragment parsed but held nothing that becomes a block.
    #[error("nothing importable")]
    Empty,
    #[error("malformed fragment: {0}")]
    Malformed(#[from] MarkupError),
}

/// Convert a markup fragment into a flat list of root blocks.
pub fn import_markup(registry: &BlockTypeRegistry, fragment: &str) -> Result<Vec<Block>, ImportError> {
    let nodes = parse_fragment(fragment)?;
    let mut importer = Importer::new(registry);
    importer.walk(&nodes);
    let blocks = importer.finish();
    if blocks.is_empty() {
        return Err(ImportError::Empty);
    }
    debug!("imported {} blocks from markup", blocks.len());
    Ok(blocks)
}

/// Convert Markdown into root blocks by way of its HTML rendering.
pub fn import_markdown(registry: &BlockTypeRegistry, source: &str) -> Result<Vec<Block>, ImportError> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let mut markup = String::new();
    html::push_html(&mut markup, Parser::new_ext(source, options));
    import_markup(registry, &markup)
}

struct Importer<'r> {
    registry: &'r BlockTypeRegistry,
    blocks: Vec<Block>,
    /// Paragraph markup waiting to become one `text` block.
    paragraph: String,
    /// Loose inline content not yet wrapped in a paragraph.
    inline: String,
    inline_visible: bool,
}

impl<'r> Importer<'r> {
    fn new(registry: &'r BlockTypeRegistry) -> Self {
        Self {
            registry,
            blocks: Vec::new(),
            paragraph: String::new(),
            inline: String::new(),
            inline_visible: false,
        }
    }

    fn walk(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Comment(_) => {}
                Node::Text(text) => {
                    self.inline.push_str(text.raw());
                    self.inline_visible |= !node.is_blank();
                }
                Node::Element(element) => self.element(element),
            }
        }
    }

    fn element(&mut self, element: &Element) {
        match element.name.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                self.emit(
                    "heading",
                    json!({
                        "text": element.text_content().trim(),
                        "level": element.name,
                        "align": "left",
                    }),
                );
            }
            "ul" | "ol" => {
                self.flush();
                let items: Vec<String> = element
                    .child_elements()
                    .filter(|child| child.name == "li")
                    .map(|li| li.text_content().trim().to_string())
                    .collect();
                let list_type = if element.name == "ol" { "numbered" } else { "bullet" };
                self.emit(
                    "list",
                    json!({ "items": items, "type": list_type, "spacing": "normal" }),
                );
            }
            "img" => {
                self.flush();
                self.image(element);
            }
            "table" => {
                self.flush();
                self.emit("text", json!({ "content": element.to_html() }));
            }
            "blockquote" => {
                self.flush();
                self.emit(
                    "quote",
                    json!({
                        "quote": element.text_content().trim(),
                        "author": "",
                        "variant": "default",
                    }),
                );
            }
            "p" => {
                self.close_inline();
                if let Some(image) = sole_image(element) {
                    self.flush();
                    self.image(image);
                } else if is_visible(element) {
                    self.paragraph.push_str(&element.to_html());
                }
            }
            _ if element.is_inline() => {
                self.inline.push_str(&element.to_html());
                self.inline_visible |= is_visible(element);
            }
            _ if element.children.is_empty() => {
                self.close_inline();
                self.paragraph.push_str(&element.to_html());
            }
            _ => {
                self.close_inline();
                self.walk(&element.children);
            }
        }
    }

    fn image(&mut self, element: &Element) {
        let src = element.attr("src").unwrap_or_default();
        if src.is_empty() {
            debug!("skipping image without src");
            return;
        }
        let alt = element.attr("alt").unwrap_or_default();
        self.emit("image", json!({ "src": src, "alt": alt, "caption": alt }));
    }

    /// Wrap pending inline content in a paragraph.
    fn close_inline(&mut self) {
        let inline = std::mem::take(&mut self.inline);
        if std::mem::take(&mut self.inline_visible) {
            self.paragraph.push_str("<p>");
            self.paragraph.push_str(inline.trim());
            self.paragraph.push_str("</p>");
        }
    }

    /// Emit the paragraph buffer as a `text` block.
    fn flush(&mut self) {
        self.close_inline();
        if !self.paragraph.is_empty() {
            let content = std::mem::take(&mut self.paragraph);
            self.emit("text", json!({ "content": content }));
        }
    }

    fn emit(&mut self, tag: &str, properties: Value) {
        let Value::Object(overrides) = properties else {
            return;
        };
        match self.registry.create_block_with(tag, overrides) {
            Some(block) => self.blocks.push(block),
            None => warn!("import produced a {tag:?} block but the registry has no such type"),
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

fn is_visible(element: &Element) -> bool {
    !element.text_content().trim().is_empty() || contains_image(element)
}

fn contains_image(element: &Element) -> bool {
    element.name == "img" || element.child_elements().any(contains_image)
}

/// The image of a paragraph whose only visible content is one `<img>`.
fn sole_image(paragraph: &Element) -> Option<&Element> {
    let mut visible = paragraph.children.iter().filter(|node| !node.is_blank());
    match (visible.next(), visible.next()) {
        (Some(Node::Element(image)), None) if image.name == "img" => Some(image),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn import(fragment: &str) -> Result<Vec<Value>, ImportError> {
        let registry = BlockTypeRegistry::builtin();
        import_markup(&registry, fragment).map(summarise)
    }

    /// Block type under `block` plus the properties; ids are dropped since
    /// they are fresh each time.
    fn summarise(blocks: Vec<Block>) -> Vec<Value> {
        blocks
            .into_iter()
            .map(|block| {
                let mut map = block.properties;
                map.insert("block".to_string(), Value::String(block.block_type));
                Value::Object(map)
            })
            .collect()
    }

    #[test]
    fn single_paragraph_becomes_one_text_block() {
        assert_eq!(
            import("<p>Hello</p>").unwrap(),
            vec![json!({ "block": "text", "content": "<p>Hello</p>" })]
        );
    }

    #[test]
    fn image_mid_sentence_stays_in_its_paragraph() {
        assert_eq!(
            import(r#"<p>See the <img src="map.png" alt="map"> below</p><h2>Next</h2>"#).unwrap(),
            vec![
                json!({
                    "block": "text",
                    "content": r#"<p>See the <img src="map.png" alt="map"> below</p>"#
                }),
                json!({ "block": "heading", "text": "Next", "level": "h2", "align": "left" }),
            ]
        );
    }

    #[test]
    fn heading_then_paragraph() {
        assert_eq!(
            import("<h2>Title</h2><p>Body</p>").unwrap(),
            vec![
                json!({ "block": "heading", "text": "Title", "level": "h2", "align": "left" }),
                json!({ "block": "text", "content": "<p>Body</p>" }),
            ]
        );
    }

    #[test]
    fn consecutive_paragraphs_are_grouped() {
        assert_eq!(
            import("<p>One</p>\n<p>Two <b>bold</b></p>\n<h3>Next</h3>").unwrap()[0],
            json!({ "block": "text", "content": "<p>One</p><p>Two <b>bold</b></p>" })
        );
    }

    #[test]
    fn lists_images_quotes_and_tables() {
        let blocks = import(concat!(
            "<ol><li> First </li><li>Second</li></ol>",
            "<p><img src=\"/hall.jpg\" alt=\"Main hall\"></p>",
            "<blockquote>Knowledge is power</blockquote>",
            "<table><tr><td>A</td></tr></table>",
        ))
        .unwrap();
        assert_eq!(
            blocks,
            vec![
                json!({ "block": "list", "items": ["First", "Second"], "type": "numbered", "spacing": "normal" }),
                json!({ "block": "image", "src": "/hall.jpg", "alt": "Main hall", "caption": "Main hall" }),
                json!({ "block": "quote", "quote": "Knowledge is power", "author": "", "variant": "default" }),
                json!({ "block": "text", "content": "<table><tr><td>A</td></tr></table>" }),
            ]
        );
    }

    #[test]
    fn loose_inline_content_is_wrapped() {
        assert_eq!(
            import("Welcome to <em>Year 7</em>!<h2>Term dates</h2>").unwrap()[0],
            json!({ "block": "text", "content": "<p>Welcome to <em>Year 7</em>!</p>" })
        );
    }

    #[test]
    fn unknown_containers_are_walked_into() {
        assert_eq!(
            import("<section><div><h4>Clubs</h4><p>Chess</p></div></section>").unwrap(),
            vec![
                json!({ "block": "heading", "text": "Clubs", "level": "h4", "align": "left" }),
                json!({ "block": "text", "content": "<p>Chess</p>" }),
            ]
        );
    }

    #[test]
    fn empty_leaf_elements_join_the_paragraph() {
        assert_eq!(
            import("<p>Above</p><hr><p>Below</p>").unwrap(),
            vec![json!({ "block": "text", "content": "<p>Above</p><hr><p>Below</p>" })]
        );
    }

    #[test]
    fn nothing_importable() {
        assert_eq!(import("  <!-- note -->\n<p> </p>"), Err(ImportError::Empty));
        assert_eq!(import(""), Err(ImportError::Empty));
    }

    #[test]
    fn malformed_fragment_is_a_hard_failure() {
        assert!(matches!(
            import("<p>ok</p><img src=\"x"),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn markdown_goes_through_the_same_path() {
        let registry = BlockTypeRegistry::builtin();
        let blocks =
            import_markdown(&registry, "# Sports Day\n\nBring *water*.\n\n- Hat\n- Sun cream\n").unwrap();
        let types: Vec<&str> = blocks.iter().map(|b| b.block_type.as_str()).collect();
        assert_eq!(types, vec!["heading", "text", "list"]);
        assert_snapshot!(blocks[1].str_prop("content").unwrap_or_default(), @"<p>Bring <em>water</em>.</p>");
    }
}
