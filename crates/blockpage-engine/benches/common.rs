// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use blockpage_engine::models::{Block, Properties};
use serde_json::{Value, json};

fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

/// `sections` root sections, each a heading with `depth` levels of nested
/// children plus a tabs block and a two-column block holding text.
#[allow(dead_code)]
pub fn generate_page_blocks(sections: usize, depth: usize) -> Vec<Block> {
    (0..sections)
        .flat_map(|section| {
            let heading = Block::with_id(
                format!("h{section}"),
                "heading",
                props(json!({ "text": format!("Section {section}"), "level": "h2" })),
            )
            .with_children(nested(&format!("s{section}"), depth));

            let tabs = Block::with_id(
                format!("tabs{section}"),
                "tabs",
                props(json!({
                    "tabs": [
                        { "label": "One", "fallbackContent": "", "blocks": [text(&format!("tab{section}a"))] },
                        { "label": "Two", "fallbackContent": "", "blocks": [text(&format!("tab{section}b"))] }
                    ]
                })),
            );

            let columns = Block::with_id(
                format!("cols{section}"),
                "columns",
                props(json!({
                    "layout": "1-1",
                    "columns": [
                        { "blocks": [text(&format!("col{section}a"))] },
                        { "blocks": [text(&format!("col{section}b"))] }
                    ]
                })),
            );

            [heading, tabs, columns]
        })
        .collect()
}

#[allow(dead_code)]
pub fn text(id: &str) -> Block {
    Block::with_id(id, "text", props(json!({ "content": format!("<p>{id}</p>") })))
}

fn nested(prefix: &str, depth: usize) -> Vec<Block> {
    if depth == 0 {
        return Vec::new();
    }
    let id = format!("{prefix}-{depth}");
    vec![text(&id).with_children(nested(prefix, depth - 1))]
}
