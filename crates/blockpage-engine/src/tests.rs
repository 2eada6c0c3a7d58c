//! Shared fixtures for unit tests.

use serde_json::{Value, json};
use tempfile::TempDir;

use crate::models::{Block, Properties};

pub fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn text(id: &str) -> Block {
    Block::with_id(id, "text", props(json!({ "content": id })))
}

/// A page exercising every nesting mechanism:
///
/// ```text
/// intro            children: child -> grandchild
/// tabs             tab:0 = [t0], tab:1 = []
/// cols (1-1)       column:0 = [c0], column:1 = [c1]
/// outro
/// ```
pub fn fixture_page() -> Vec<Block> {
    let intro = text("intro").with_children(vec![text("child").with_children(vec![text("grandchild")])]);
    let tabs = Block::with_id(
        "tabs",
        "tabs",
        props(json!({
            "tabs": [
                { "label": "Overview", "fallbackContent": "Coming soon", "blocks": [text("t0")] },
                { "label": "Staff", "fallbackContent": "", "blocks": [] }
            ]
        })),
    );
    let cols = Block::with_id(
        "cols",
        "columns",
        props(json!({
            "layout": "1-1",
            "columns": [{ "blocks": [text("c0")] }, { "blocks": [text("c1")] }]
        })),
    );
    vec![intro, tabs, cols, text("outro")]
}

pub fn create_test_pages_dir() -> TempDir {
    TempDir::new().expect("create temp pages dir")
}
