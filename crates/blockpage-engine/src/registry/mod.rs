//! # Block Type Registry
//!
//! Maps a block type tag to the properties new blocks of that type start
//! with and to the renderer that turns a block into HTML.
//!
//! The registry is built once and read afterwards. A process-wide instance
//! is installed with [`init`] at startup; [`global`] hands it out and falls
//! back to [`BlockTypeRegistry::builtin`] when nothing was installed.

mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::models::{Block, BlockId, Properties};
use crate::render::Renderer;

/// What a block renderer gets to work with.
///
/// The block's generic children are rendered before the block itself, so
/// `children_html` is finished markup. Tab and column slots are rendered by
/// the block's own renderer through [`Renderer::render_slot`].
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub block: &'a Block,
    pub children_html: &'a str,
}

impl<'a> RenderInput<'a> {
    pub fn id(&self) -> &'a BlockId {
        &self.block.id
    }

    pub fn block_type(&self) -> &'a str {
        &self.block.block_type
    }

    pub fn properties(&self) -> &'a Properties {
        &self.block.properties
    }

    /// A string property, or `""` when absent or not a string.
    pub fn text(&self, key: &str) -> &'a str {
        self.block.str_prop(key).unwrap_or_default()
    }

    /// A string property escaped for use as element content.
    pub fn escaped(&self, key: &str) -> String {
        html_escape::encode_text(self.text(key)).into_owned()
    }

    /// A string property escaped for use inside a double-quoted attribute.
    pub fn attr(&self, key: &str) -> String {
        html_escape::encode_double_quoted_attribute(self.text(key)).into_owned()
    }

    /// A string property if it is one of `allowed`, else `fallback`.
    pub fn choice(&self, key: &str, allowed: &[&'static str], fallback: &'static str) -> &'static str {
        let value = self.text(key);
        allowed
            .iter()
            .copied()
            .find(|candidate| *candidate == value)
            .unwrap_or(fallback)
    }
}

/// Turns one block into markup.
pub trait BlockRenderer: Send + Sync {
    fn render(&self, input: &RenderInput<'_>, renderer: &mut Renderer<'_>) -> String;
}

impl<F> BlockRenderer for F
where
    F: Fn(&RenderInput<'_>, &mut Renderer<'_>) -> String + Send + Sync,
{
    fn render(&self, input: &RenderInput<'_>, renderer: &mut Renderer<'_>) -> String {
        self(input, renderer)
    }
}

/// A registered block type.
#[derive(Clone)]
pub struct BlockType {
    pub tag: String,
    /// Human-readable name for pickers.
    pub label: String,
    pub defaults: Properties,
    pub renderer: Arc<dyn BlockRenderer>,
}

impl BlockType {
    pub fn new(
        tag: impl Into<String>,
        label: impl Into<String>,
        defaults: Properties,
        renderer: impl BlockRenderer + 'static,
    ) -> Self {
        Self {
            tag: tag.into(),
            label: label.into(),
            defaults,
            renderer: Arc::new(renderer),
        }
    }
}

impl fmt::Debug for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockType")
            .field("tag", &self.tag)
            .field("label", &self.label)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockTypeRegistry {
    types: BTreeMap<String, BlockType>,
}

impl BlockTypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The block types the page builder ships with.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for block_type in builtin::block_types() {
            registry.register(block_type);
        }
        registry
    }

    /// Add a type, returning the one it replaced.
    pub fn register(&mut self, block_type: BlockType) -> Option<BlockType> {
        self.types.insert(block_type.tag.clone(), block_type)
    }

    pub fn lookup(&self, tag: &str) -> Option<&BlockType> {
        self.types.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn types(&self) -> impl Iterator<Item = &BlockType> {
        self.types.values()
    }

    /// A new block of type `tag` seeded with the type's defaults.
    pub fn create_block(&self, tag: &str) -> Option<Block> {
        self.create_block_with(tag, Properties::new())
    }

    /// A new block of type `tag`, defaults overlaid with `overrides`.
    pub fn create_block_with(&self, tag: &str, overrides: Properties) -> Option<Block> {
        let block_type = self.lookup(tag)?;
        let mut properties = block_type.defaults.clone();
        properties.extend(overrides);
        Some(Block::new(tag, properties))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("block type registry already initialised")]
    AlreadyInitialized,
}

static GLOBAL: OnceLock<BlockTypeRegistry> = OnceLock::new();

/// Install the process-wide registry. Call once at startup, before any
/// rendering or block creation goes through [`global`].
pub fn init(registry: BlockTypeRegistry) -> Result<(), RegistryError> {
    GLOBAL
        .set(registry)
        .map_err(|_| RegistryError::AlreadyInitialized)
}

/// The process-wide registry.
pub fn global() -> &'static BlockTypeRegistry {
    GLOBAL.get_or_init(BlockTypeRegistry::builtin)
}

/// Unwrap a JSON object literal into a property map.
pub(crate) fn object(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}
