use std::fmt::Write;

use serde_json::{Value, json};

use crate::models::{ColumnLayout, SlotFamily};
use crate::registry::{BlockType, RenderInput, object};
use crate::render::Renderer;

pub(super) fn block_types() -> Vec<BlockType> {
    vec![
        BlockType::new("text", "Text", object(json!({ "content": "" })), text),
        BlockType::new(
            "heading",
            "Heading",
            object(json!({ "text": "Heading", "level": "h2", "align": "left" })),
            heading,
        ),
        BlockType::new(
            "image",
            "Image",
            object(json!({ "src": "", "alt": "", "caption": "" })),
            image,
        ),
        BlockType::new(
            "list",
            "List",
            object(json!({ "items": ["List item"], "type": "bullet", "spacing": "normal" })),
            list,
        ),
        BlockType::new(
            "quote",
            "Quote",
            object(json!({ "quote": "", "author": "", "variant": "default" })),
            quote,
        ),
        BlockType::new(
            "button",
            "Button",
            object(json!({ "text": "Learn more", "url": "#", "variant": "primary" })),
            button,
        ),
        BlockType::new("divider", "Divider", object(json!({ "style": "solid" })), divider),
        BlockType::new("spacer", "Spacer", object(json!({ "height": 32 })), spacer),
        BlockType::new("video", "Video", object(json!({ "url": "", "title": "" })), video),
        BlockType::new(
            "card",
            "Card",
            object(json!({ "title": "", "body": "", "image": "" })),
            card,
        ),
        BlockType::new(
            "tabs",
            "Tabs",
            object(json!({
                "tabs": [
                    { "label": "Tab 1", "fallbackContent": "", "blocks": [] },
                    { "label": "Tab 2", "fallbackContent": "", "blocks": [] }
                ]
            })),
            tabs,
        ),
        BlockType::new(
            "columns",
            "Columns",
            object(json!({ "layout": "1-1", "columns": [{ "blocks": [] }, { "blocks": [] }] })),
            columns,
        ),
    ]
}

/// Append the generic children after a block's own markup.
fn with_children(html: String, input: &RenderInput<'_>) -> String {
    if input.children_html.is_empty() {
        html
    } else {
        format!(
            "{html}\n<div class=\"block-children\">{}</div>",
            input.children_html
        )
    }
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// `content` is authored markup and goes out as written.
fn text(input: &RenderInput<'_>, _: &mut Renderer<'_>) -> String {
    let html = format!("<div class=\"block-text\">{}</div>", input.text("content"));
    with_children(html, input)
}

fn heading(input: &RenderInput<'_>, _: &mut Renderer<'_>) -> String {
    let level = input.choice("level", &["h1", "h2", "h3", "h4", "h5", "h6"], "h2");
    let align = input.choice("align", &["left", "center", "right"], "left");
    let html = format!(
        "<{level} class=\"block-heading\" style=\"text-align: {align}\">{}</{level}>",
        input.escaped("text")
    );
    with_children(html, input)
}

fn image(input: &RenderInput<'_>, _: &mut Renderer<'_>) -> String {
    let mut html = format!(
        "<figure class=\"block-image\"><img src=\"{}\" alt=\"{}\">",
        input.attr("src"),
        input.attr("alt")
    );
    if !input.text("caption").is_empty() {
        let _ = write!(html, "<figcaption>{}</figcaption>", input.escaped("caption"));
    }
    html.push_str("</figure>");
    with_children(html, input)
}

fn list(input: &RenderInput<'_>, _: &mut Renderer<'_>) -> String {
    let tag = if input.text("type") == "numbered" { "ol" } else { "ul" };
    let spacing = input.choice("spacing", &["compact", "normal", "relaxed"], "normal");
    let mut html = format!("<{tag} class=\"block-list spacing-{spacing}\">");
    let items = input
        .properties()
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for item in items.iter().filter_map(Value::as_str) {
        let _ = write!(html, "<li>{}</li>", escape(item));
    }
    let _ = write!(html, "</{tag}>");
    with_children(html, input)
}

fn quote(input: &RenderInput<'_>, _: &mut Renderer<'_>) -> String {
    let mut html = format!(
        "<blockquote class=\"block-quote quote-{}\"><p>{}</p>",
        input.attr("variant"),
        input.escaped("quote")
    );
    if !input.text("author").is_empty() {
        let _ = write!(html, "<cite>{}</cite>", input.escaped("author"));
    }
    html.push_str("</blockquote>");
    with_children(html, input)
}

fn button(input: &RenderInput<'_>, _: &mut Renderer<'_>) -> String {
    let html = format!(
        "<a class=\"block-button button-{}\" href=\"{}\">{}</a>",
        input.attr("variant"),
        input.attr("url"),
        input.escaped("text")
    );
    with_children(html, input)
}

fn divider(input: &RenderInput<'_>, _: &mut Renderer<'_>) -> String {
    with_children(
        format!("<hr class=\"block-divider divider-{}\">", input.attr("style")),
        input,
    )
}

fn spacer(input: &RenderInput<'_>, _: &mut Renderer<'_>) -> String {
    let height = input
        .properties()
        .get("height")
        .and_then(Value::as_u64)
        .unwrap_or(32);
    with_children(
        format!("<div class=\"block-spacer\" style=\"height: {height}px\"></div>"),
        input,
    )
}

fn video(input: &RenderInput<'_>, _: &mut Renderer<'_>) -> String {
    let html = format!(
        "<div class=\"block-video\"><iframe src=\"{}\" title=\"{}\" allowfullscreen></iframe></div>",
        input.attr("url"),
        input.attr("title")
    );
    with_children(html, input)
}

fn card(input: &RenderInput<'_>, _: &mut Renderer<'_>) -> String {
    let mut html = String::from("<div class=\"block-card\">");
    if !input.text("image").is_empty() {
        let _ = write!(
            html,
            "<img src=\"{}\" alt=\"{}\">",
            input.attr("image"),
            input.attr("title")
        );
    }
    let _ = write!(
        html,
        "<h3>{}</h3><p>{}</p></div>",
        input.escaped("title"),
        input.escaped("body")
    );
    with_children(html, input)
}

/// Tab labels, then one panel per tab. A tab without blocks shows its
/// fallback text.
fn tabs(input: &RenderInput<'_>, renderer: &mut Renderer<'_>) -> String {
    let entries = input.block.slot_entries(SlotFamily::Tabs);
    let mut labels = String::new();
    let mut panels = String::new();
    for (index, entry) in entries.iter().enumerate() {
        let label = entry.get("label").and_then(Value::as_str).unwrap_or_default();
        let _ = write!(labels, "<li>{}</li>", escape(label));

        let content = renderer.render_slot(input.block, SlotFamily::Tabs, index);
        let content = if content.is_empty() {
            let fallback = entry
                .get("fallbackContent")
                .and_then(Value::as_str)
                .unwrap_or_default();
            escape(fallback)
        } else {
            content
        };
        let _ = write!(panels, "\n<div class=\"tab-panel\">{content}</div>");
    }
    let html = format!("<div class=\"block-tabs\">\n<ul class=\"tab-labels\">{labels}</ul>{panels}\n</div>");
    with_children(html, input)
}

/// One flex column per entry, sized from the layout. Entries that do not
/// match the layout's column count share the row equally.
fn columns(input: &RenderInput<'_>, renderer: &mut Renderer<'_>) -> String {
    let count = input.block.slot_entries(SlotFamily::Columns).len();
    let layout = input.text("layout").parse::<ColumnLayout>().ok();
    let widths = match layout {
        Some(layout) if layout.column_count() == count => layout.widths(),
        _ => vec![100.0 / count.max(1) as f64; count],
    };

    let mut html = format!("<div class=\"block-columns layout-{}\">", input.attr("layout"));
    for (index, width) in widths.iter().enumerate() {
        let content = renderer.render_slot(input.block, SlotFamily::Columns, index);
        let _ = write!(
            html,
            "\n<div class=\"column\" style=\"flex-basis: {width:.2}%\">{content}</div>"
        );
    }
    html.push_str("\n</div>");
    with_children(html, input)
}
