use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::models::layout::ColumnLayout;
use crate::models::slot::{COLUMNS_TYPE, SlotFamily};

/// Open key/value property map of a block.
pub type Properties = Map<String, Value>;

/// Opaque block identifier, unique within a page document.
///
/// Freshly created blocks get a UUID v4; any string read from a stored
/// document is accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A block as it is stored and exchanged: a nested JSON document.
///
/// Tabs and columns keep their nested block lists inside `properties`
/// (`properties.tabs[i].blocks`, `properties.columns[i].blocks`), so the
/// persisted shape is exactly what the page builder reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub children: Vec<Block>,
    /// Informational position hint; array order is authoritative.
    #[serde(default)]
    pub order: i64,
}

impl Block {
    /// Create a block with a fresh id.
    pub fn new(block_type: impl Into<String>, properties: Properties) -> Self {
        Self::with_id(BlockId::new(), block_type, properties)
    }

    pub fn with_id(
        id: impl Into<BlockId>,
        block_type: impl Into<String>,
        properties: Properties,
    ) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            properties,
            children: Vec::new(),
            order: 0,
        }
    }

    /// Builder-style helper to attach children.
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    pub fn str_prop(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Raw entries of the tabs/columns list, or an empty slice when the
    /// block does not carry one.
    pub fn slot_entries(&self, family: SlotFamily) -> &[Value] {
        self.properties
            .get(family.property_key())
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Decode the `blocks` list of every tabs/columns entry. An entry
    /// without `blocks` yields an empty list.
    pub fn slot_blocks(&self, family: SlotFamily) -> Result<Vec<Vec<Block>>, serde_json::Error> {
        if SlotFamily::for_type(&self.block_type) != Some(family) {
            return Ok(Vec::new());
        }
        self.slot_entries(family).iter().map(entry_blocks).collect()
    }

    /// Every id in this subtree, this block first, across children, tab
    /// blocks and column blocks. Malformed nested lists are skipped.
    pub fn subtree_ids(&self) -> Vec<BlockId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<BlockId>) {
        ids.push(self.id.clone());
        for child in &self.children {
            child.collect_ids(ids);
        }
        if let Some(family) = SlotFamily::for_type(&self.block_type) {
            for list in self.slot_blocks(family).unwrap_or_default() {
                for block in &list {
                    block.collect_ids(ids);
                }
            }
        }
    }

    /// Resize `properties.columns` to the count `layout` needs and record
    /// the layout.
    ///
    /// Retained columns keep their blocks by position. Columns beyond the
    /// new count are dropped together with their blocks, so callers that
    /// care should check [`Block::columns_to_drop`] first.
    pub fn resize_columns(&mut self, layout: ColumnLayout) {
        let count = layout.column_count();
        let mut columns = self
            .properties
            .get(SlotFamily::Columns.property_key())
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        columns.truncate(count);
        while columns.len() < count {
            columns.push(json!({ "blocks": [] }));
        }
        self.properties.insert(
            SlotFamily::Columns.property_key().to_string(),
            Value::Array(columns),
        );
        self.properties
            .insert("layout".to_string(), Value::String(layout.to_string()));
    }

    /// Number of columns holding at least one block that resizing to
    /// `layout` would discard.
    pub fn columns_to_drop(&self, layout: ColumnLayout) -> usize {
        if self.block_type != COLUMNS_TYPE {
            return 0;
        }
        self.slot_entries(SlotFamily::Columns)
            .iter()
            .skip(layout.column_count())
            .filter(|entry| {
                entry
                    .get("blocks")
                    .and_then(Value::as_array)
                    .is_some_and(|blocks| !blocks.is_empty())
            })
            .count()
    }
}

impl From<Block> for Value {
    fn from(block: Block) -> Self {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(block.id.0));
        map.insert("type".to_string(), Value::String(block.block_type));
        map.insert("properties".to_string(), Value::Object(block.properties));
        map.insert(
            "children".to_string(),
            Value::Array(block.children.into_iter().map(Value::from).collect()),
        );
        map.insert("order".to_string(), Value::from(block.order));
        Value::Object(map)
    }
}

/// Decode the `blocks` field of one tabs/columns entry.
pub fn entry_blocks(entry: &Value) -> Result<Vec<Block>, serde_json::Error> {
    match entry.get("blocks") {
        Some(blocks) => Vec::<Block>::deserialize(blocks),
        None => Ok(Vec::new()),
    }
}
