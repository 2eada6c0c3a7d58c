//! # Renderer
//!
//! Walks a block list, resolves each block's type in the registry and
//! composes the renderers' output. Generic children are rendered first and
//! handed to the parent's renderer as markup; tab and column slots are left
//! to the tabs/columns renderers, which call back into [`Renderer::render_slot`].
//!
//! A block whose type is not registered contributes nothing. It is logged
//! and recorded as a [`RenderDiagnostic`]; the rest of the page still renders.

use std::fmt;

use log::warn;

use crate::editing::ContentTree;
use crate::models::{Block, BlockId, SlotFamily, entry_blocks};
use crate::registry::{BlockTypeRegistry, RenderInput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDiagnostic {
    UnknownType { id: BlockId, block_type: String },
    MalformedSlot { id: BlockId, slot: String, message: String },
}

impl fmt::Display for RenderDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderDiagnostic::UnknownType { id, block_type } => {
                write!(f, "block {id}: no renderer for type {block_type:?}")
            }
            RenderDiagnostic::MalformedSlot { id, slot, message } => {
                write!(f, "block {id}: cannot read {slot}: {message}")
            }
        }
    }
}

/// A block of the rendered list that produced output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub id: BlockId,
    pub block_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    pub html: String,
    /// Blocks of the top-level list that rendered, in order.
    pub rendered: Vec<RenderedBlock>,
    /// Problems met anywhere in the tree, nested blocks included.
    pub diagnostics: Vec<RenderDiagnostic>,
}

impl RenderOutput {
    /// Number of top-level blocks that were skipped.
    pub fn skipped(&self, total: usize) -> usize {
        total.saturating_sub(self.rendered.len())
    }
}

pub struct Renderer<'r> {
    registry: &'r BlockTypeRegistry,
    diagnostics: Vec<RenderDiagnostic>,
}

impl<'r> Renderer<'r> {
    pub fn new(registry: &'r BlockTypeRegistry) -> Self {
        Self {
            registry,
            diagnostics: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r BlockTypeRegistry {
        self.registry
    }

    /// Render a top-level block list, collecting every diagnostic raised
    /// while doing so.
    pub fn render(&mut self, blocks: &[Block]) -> RenderOutput {
        let (html, rendered) = self.render_list(blocks);
        RenderOutput {
            html,
            rendered,
            diagnostics: std::mem::take(&mut self.diagnostics),
        }
    }

    pub fn render_tree(&mut self, tree: &ContentTree) -> RenderOutput {
        self.render(&tree.to_blocks())
    }

    /// Render a nested list. Diagnostics stay with the renderer until the
    /// enclosing [`Renderer::render`] returns.
    pub fn render_blocks(&mut self, blocks: &[Block]) -> String {
        self.render_list(blocks).0
    }

    /// Render the blocks of `block`'s tab or column `index`. A malformed
    /// list renders as nothing.
    pub fn render_slot(&mut self, block: &Block, family: SlotFamily, index: usize) -> String {
        let Some(entry) = block.slot_entries(family).get(index) else {
            return String::new();
        };
        match entry_blocks(entry) {
            Ok(blocks) => self.render_blocks(&blocks),
            Err(err) => {
                warn!("block {}: malformed {} entry {index}: {err}", block.id, family.property_key());
                self.diagnostics.push(RenderDiagnostic::MalformedSlot {
                    id: block.id.clone(),
                    slot: family.slot(index).to_string(),
                    message: err.to_string(),
                });
                String::new()
            }
        }
    }

    fn render_list(&mut self, blocks: &[Block]) -> (String, Vec<RenderedBlock>) {
        let registry = self.registry;
        let mut parts = Vec::with_capacity(blocks.len());
        let mut rendered = Vec::with_capacity(blocks.len());

        for block in blocks {
            let Some(block_type) = registry.lookup(&block.block_type) else {
                warn!(
                    "skipping block {} with unknown type {:?}",
                    block.id, block.block_type
                );
                self.diagnostics.push(RenderDiagnostic::UnknownType {
                    id: block.id.clone(),
                    block_type: block.block_type.clone(),
                });
                continue;
            };

            let children_html = self.render_blocks(&block.children);
            let input = RenderInput {
                block,
                children_html: &children_html,
            };
            parts.push(block_type.renderer.render(&input, self));
            rendered.push(RenderedBlock {
                id: block.id.clone(),
                block_type: block.block_type.clone(),
            });
        }

        (parts.join("\n"), rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Properties;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn block(id: &str, block_type: &str) -> Block {
        Block::with_id(id, block_type, Properties::new())
    }

    #[test]
    fn unknown_types_are_skipped_not_fatal() {
        let registry = BlockTypeRegistry::builtin();
        let blocks = vec![
            block("a", "divider"),
            block("b", "carousel"),
            block("c", "spacer"),
            block("d", "marquee"),
        ];
        let output = Renderer::new(&registry).render(&blocks);

        let ids: Vec<&str> = output.rendered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(output.skipped(blocks.len()), 2);
        assert_eq!(
            output.diagnostics,
            vec![
                RenderDiagnostic::UnknownType {
                    id: "b".into(),
                    block_type: "carousel".to_string()
                },
                RenderDiagnostic::UnknownType {
                    id: "d".into(),
                    block_type: "marquee".to_string()
                },
            ]
        );
        assert_eq!(
            output.html,
            "<hr class=\"block-divider divider-\">\n<div class=\"block-spacer\" style=\"height: 32px\"></div>"
        );
    }

    #[test]
    fn nested_unknown_types_are_reported_too() {
        let registry = BlockTypeRegistry::builtin();
        let mut tabs = block("tabs", "tabs");
        tabs.properties.insert(
            "tabs".to_string(),
            json!([{ "label": "A", "fallbackContent": "", "blocks": [{ "id": "x", "type": "mystery" }] }]),
        );
        let parent = block("p", "divider").with_children(vec![block("y", "mystery")]);

        let output = Renderer::new(&registry).render(&[tabs, parent]);
        assert_eq!(output.rendered.len(), 2);
        let ids: Vec<String> = output
            .diagnostics
            .iter()
            .map(|d| match d {
                RenderDiagnostic::UnknownType { id, .. } => id.to_string(),
                other => panic!("unexpected {other}"),
            })
            .collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn malformed_slot_renders_empty_with_diagnostic() {
        let registry = BlockTypeRegistry::builtin();
        let mut cols = block("cols", "columns");
        cols.properties
            .insert("columns".to_string(), json!([{ "blocks": 7 }]));
        let output = Renderer::new(&registry).render(&[cols]);
        assert_eq!(output.rendered.len(), 1);
        assert!(matches!(
            &output.diagnostics[..],
            [RenderDiagnostic::MalformedSlot { slot, .. }] if slot == "column:0"
        ));
    }
}
