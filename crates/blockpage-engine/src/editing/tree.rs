//! # Content Tree
//!
//! The page's blocks held as an arena: every block is a [`Node`] keyed by
//! its id, and structure is expressed as id lists. Each node owns one list
//! per [`SlotKey`]: the generic `children` slot, plus one slot per tab of a
//! `"tabs"` block or per column of a `"columns"` block. One traversal serves
//! all three nesting mechanisms.
//!
//! Nodes sit behind `Arc`, so cloning a tree copies pointers only and an
//! edit that replaces one node leaves every other node shared with the
//! previous tree (`Arc::ptr_eq` holds for them).
//!
//! The wire form ([`Block`]) is converted in with [`ContentTree::from_blocks`]
//! and back out with [`ContentTree::to_blocks`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::models::{Block, BlockId, ContainerKind, Properties, SlotFamily, SlotKey, entry_blocks};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("duplicate block id {0}")]
    DuplicateId(BlockId),
    #[error("block {id} has a malformed {key} list: {message}")]
    MalformedSlot {
        id: BlockId,
        key: &'static str,
        message: String,
    },
}

/// One block in the arena.
///
/// For tabs/columns blocks, `properties.tabs[i]` / `properties.columns[i]`
/// hold the entry metadata (label, fallback content, ...) while the entry's
/// blocks live in slot `Tab(i)` / `Column(i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: BlockId,
    pub block_type: String,
    pub properties: Properties,
    pub slots: BTreeMap<SlotKey, Vec<BlockId>>,
    pub order: i64,
}

impl Node {
    pub fn slot(&self, key: SlotKey) -> Option<&[BlockId]> {
        self.slots.get(&key).map(Vec::as_slice)
    }

    pub fn children(&self) -> &[BlockId] {
        self.slot(SlotKey::Children).unwrap_or_default()
    }

    pub fn str_prop(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// A list that holds blocks: the page root or one slot of a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Container {
    Root,
    Slot { parent: BlockId, slot: SlotKey },
}

impl Container {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Container::Root => ContainerKind::Root,
            Container::Slot { slot, .. } => slot.container_kind(),
        }
    }

    pub fn parent(&self) -> Option<&BlockId> {
        match self {
            Container::Root => None,
            Container::Slot { parent, .. } => Some(parent),
        }
    }
}

/// Where a block sits: its container and its index in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub container: Container,
    pub index: usize,
}

/// A block reached during a depth-first walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub id: BlockId,
    pub location: Location,
    /// 0 for root blocks.
    pub depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ContentTree {
    pub(crate) root: Arc<Vec<BlockId>>,
    pub(crate) nodes: Arc<HashMap<BlockId, Arc<Node>>>,
}

impl ContentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the arena from a root block list.
    ///
    /// Fails if any id occurs twice anywhere in the input, or if a
    /// tabs/columns entry carries something other than a block list.
    pub fn from_blocks(blocks: &[Block]) -> Result<Self, TreeError> {
        let mut tree = Self::default();
        let mut root = Vec::with_capacity(blocks.len());
        for block in blocks {
            root.push(tree.absorb(block)?);
        }
        tree.root = Arc::new(root);
        Ok(tree)
    }

    /// Rebuild the wire form of the whole page.
    pub fn to_blocks(&self) -> Vec<Block> {
        self.root
            .iter()
            .filter_map(|id| self.materialize(id))
            .collect()
    }

    pub fn root_ids(&self) -> &[BlockId] {
        &self.root
    }

    /// Number of blocks across all containers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &BlockId) -> Option<&Node> {
        self.nodes.get(id).map(Arc::as_ref)
    }

    /// Whether both trees hold the very same node allocation for `id`.
    pub fn shares_node_with(&self, other: &ContentTree, id: &BlockId) -> bool {
        match (self.nodes.get(id), other.nodes.get(id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether both trees are the same version: same root list and same
    /// arena allocation. Cloning a tree or an edit that changes nothing
    /// keeps this true.
    pub fn shares_arena_with(&self, other: &ContentTree) -> bool {
        Arc::ptr_eq(&self.root, &other.root) && Arc::ptr_eq(&self.nodes, &other.nodes)
    }

    /// The block with `id` and its whole subtree, in wire form.
    pub fn locate(&self, id: &BlockId) -> Option<Block> {
        self.materialize(id)
    }

    /// The container holding `id` and its index there.
    pub fn locate_parent(&self, id: &BlockId) -> Option<Location> {
        self.path_to(id).and_then(|mut path| path.pop())
    }

    /// Nesting depth of `id`; 0 for root blocks.
    pub fn depth_of(&self, id: &BlockId) -> Option<usize> {
        self.path_to(id).map(|path| path.len() - 1)
    }

    /// Ids of the blocks enclosing `id`, outermost first.
    pub fn ancestors(&self, id: &BlockId) -> Vec<BlockId> {
        self.path_to(id)
            .map(|path| {
                path.iter()
                    .filter_map(|location| location.container.parent().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `id` followed by all its descendants, depth first, slots in
    /// [`SlotKey`] order.
    pub fn subtree_ids(&self, id: &BlockId) -> Vec<BlockId> {
        let mut ids = Vec::new();
        self.collect_subtree(id, &mut ids);
        ids
    }

    fn collect_subtree(&self, id: &BlockId, ids: &mut Vec<BlockId>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        ids.push(id.clone());
        for list in node.slots.values() {
            for child in list {
                self.collect_subtree(child, ids);
            }
        }
    }

    /// Every block in depth-first order: each block, then its children,
    /// then its tab slots, then its column slots.
    pub fn walk(&self) -> Vec<Visit> {
        let mut visits = Vec::with_capacity(self.nodes.len());
        self.walk_list(&self.root, &Container::Root, 0, &mut visits);
        visits
    }

    fn walk_list(&self, list: &[BlockId], container: &Container, depth: usize, out: &mut Vec<Visit>) {
        for (index, id) in list.iter().enumerate() {
            out.push(Visit {
                id: id.clone(),
                location: Location {
                    container: container.clone(),
                    index,
                },
                depth,
            });
            if let Some(node) = self.nodes.get(id) {
                for (key, ids) in &node.slots {
                    let inner = Container::Slot {
                        parent: id.clone(),
                        slot: *key,
                    };
                    self.walk_list(ids, &inner, depth + 1, out);
                }
            }
        }
    }

    /// Locations from the root list down to `id`, inclusive.
    fn path_to(&self, id: &BlockId) -> Option<Vec<Location>> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        let mut path = Vec::new();
        self.search(&self.root, &Container::Root, id, &mut path)
            .then_some(path)
    }

    fn search(
        &self,
        list: &[BlockId],
        container: &Container,
        target: &BlockId,
        path: &mut Vec<Location>,
    ) -> bool {
        for (index, id) in list.iter().enumerate() {
            path.push(Location {
                container: container.clone(),
                index,
            });
            if id == target {
                return true;
            }
            if let Some(node) = self.nodes.get(id) {
                for (key, ids) in &node.slots {
                    let inner = Container::Slot {
                        parent: id.clone(),
                        slot: *key,
                    };
                    if self.search(ids, &inner, target, path) {
                        return true;
                    }
                }
            }
            path.pop();
        }
        false
    }

    /// The id list behind a container, if it exists.
    pub fn container(&self, container: &Container) -> Option<&[BlockId]> {
        match container {
            Container::Root => Some(&self.root),
            Container::Slot { parent, slot } => self.nodes.get(parent)?.slot(*slot),
        }
    }

    pub(crate) fn container_mut(&mut self, container: &Container) -> Option<&mut Vec<BlockId>> {
        match container {
            Container::Root => Some(Arc::make_mut(&mut self.root)),
            Container::Slot { parent, slot } => self.node_mut(parent)?.slots.get_mut(slot),
        }
    }

    pub(crate) fn node_mut(&mut self, id: &BlockId) -> Option<&mut Node> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        Arc::make_mut(&mut self.nodes).get_mut(id).map(Arc::make_mut)
    }

    /// Drop `id` and its descendants from the arena. The caller unlinks
    /// `id` from its container.
    pub(crate) fn remove_subtree(&mut self, id: &BlockId) -> Vec<BlockId> {
        let ids = self.subtree_ids(id);
        let nodes = Arc::make_mut(&mut self.nodes);
        for removed in &ids {
            nodes.remove(removed);
        }
        ids
    }

    /// Add a wire block and its whole subtree to the arena, returning its
    /// id. The caller links the id into a container.
    ///
    /// On error the arena may hold part of the subtree; callers work on a
    /// scratch copy and discard it.
    pub(crate) fn absorb(&mut self, block: &Block) -> Result<BlockId, TreeError> {
        let mut properties = block.properties.clone();
        let mut slots = BTreeMap::new();

        let children = block
            .children
            .iter()
            .map(|child| self.absorb(child))
            .collect::<Result<Vec<_>, _>>()?;
        slots.insert(SlotKey::Children, children);

        if let Some(family) = SlotFamily::for_type(&block.block_type)
            && let Some(Value::Array(entries)) = properties.get_mut(family.property_key())
        {
            for (index, entry) in entries.iter_mut().enumerate() {
                let nested = entry_blocks(entry).map_err(|err| TreeError::MalformedSlot {
                    id: block.id.clone(),
                    key: family.property_key(),
                    message: err.to_string(),
                })?;
                *entry = entry_metadata(std::mem::take(entry));
                let ids = nested
                    .iter()
                    .map(|b| self.absorb(b))
                    .collect::<Result<Vec<_>, _>>()?;
                slots.insert(family.slot(index), ids);
            }
        }

        let node = Node {
            id: block.id.clone(),
            block_type: block.block_type.clone(),
            properties,
            slots,
            order: block.order,
        };
        if Arc::make_mut(&mut self.nodes)
            .insert(block.id.clone(), Arc::new(node))
            .is_some()
        {
            return Err(TreeError::DuplicateId(block.id.clone()));
        }
        Ok(block.id.clone())
    }

    fn materialize(&self, id: &BlockId) -> Option<Block> {
        let node = self.nodes.get(id)?;
        let mut properties = node.properties.clone();

        if let Some(family) = SlotFamily::for_type(&node.block_type)
            && let Some(Value::Array(entries)) = properties.get_mut(family.property_key())
        {
            for (index, entry) in entries.iter_mut().enumerate() {
                let blocks: Vec<Value> = node
                    .slot(family.slot(index))
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|id| self.materialize(id))
                    .map(Value::from)
                    .collect();
                if let Value::Object(map) = entry {
                    map.insert("blocks".to_string(), Value::Array(blocks));
                }
            }
        }

        Some(Block {
            id: node.id.clone(),
            block_type: node.block_type.clone(),
            properties,
            children: node
                .children()
                .iter()
                .filter_map(|id| self.materialize(id))
                .collect(),
            order: node.order,
        })
    }
}

/// A tabs/columns entry without its `blocks`. Entries are always objects in
/// the arena.
pub(crate) fn entry_metadata(entry: Value) -> Value {
    match entry {
        Value::Object(mut map) => {
            map.remove("blocks");
            Value::Object(map)
        }
        _ => Value::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{fixture_page, props, text};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn round_trips_all_nesting_mechanisms() {
        let blocks = fixture_page();
        let tree = ContentTree::from_blocks(&blocks).unwrap();
        assert_eq!(tree.to_blocks(), blocks);
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn tab_metadata_stays_in_properties_blocks_move_to_slots() {
        let tree = ContentTree::from_blocks(&fixture_page()).unwrap();
        let tabs = tree.node(&"tabs".into()).unwrap();

        assert_eq!(
            tabs.properties["tabs"],
            json!([
                { "label": "Overview", "fallbackContent": "Coming soon" },
                { "label": "Staff", "fallbackContent": "" }
            ])
        );
        assert_eq!(tabs.slot(SlotKey::Tab(0)).unwrap(), &[BlockId::from("t0")]);
        assert_eq!(tabs.slot(SlotKey::Tab(1)).unwrap(), &[] as &[BlockId]);
        assert!(tabs.slot(SlotKey::Tab(2)).is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected_across_mechanisms() {
        let mut blocks = fixture_page();
        blocks.push(text("t0"));
        assert_eq!(
            ContentTree::from_blocks(&blocks).unwrap_err(),
            TreeError::DuplicateId("t0".into())
        );
    }

    #[test]
    fn malformed_slot_list_is_an_error() {
        let bad = Block::with_id(
            "tabs",
            "tabs",
            props(json!({ "tabs": [{ "label": "A", "blocks": "nope" }] })),
        );
        assert!(matches!(
            ContentTree::from_blocks(&[bad]),
            Err(TreeError::MalformedSlot { key: "tabs", .. })
        ));
    }

    #[test]
    fn only_tabs_type_gets_tab_slots() {
        let lookalike = Block::with_id(
            "x",
            "text",
            props(json!({ "tabs": [{ "blocks": [{ "id": "n", "type": "text" }] }] })),
        );
        let tree = ContentTree::from_blocks(std::slice::from_ref(&lookalike)).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.to_blocks(), vec![lookalike]);
    }

    #[test]
    fn locate_parent_reports_each_container_kind() {
        let tree = ContentTree::from_blocks(&fixture_page()).unwrap();

        let kinds: Vec<(String, ContainerKind, usize)> = ["intro", "child", "t0", "c1"]
            .into_iter()
            .map(|id| {
                let location = tree.locate_parent(&id.into()).unwrap();
                (id.to_string(), location.container.kind(), location.index)
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("intro".to_string(), ContainerKind::Root, 0),
                ("child".to_string(), ContainerKind::Children, 0),
                ("t0".to_string(), ContainerKind::TabBlocks, 0),
                ("c1".to_string(), ContainerKind::ColumnBlocks, 0),
            ]
        );
        assert_eq!(
            tree.locate_parent(&"c1".into()).unwrap().container,
            Container::Slot {
                parent: "cols".into(),
                slot: SlotKey::Column(1)
            }
        );
        assert_eq!(tree.locate_parent(&"missing".into()), None);
    }

    #[test]
    fn walk_order_and_depths() {
        let tree = ContentTree::from_blocks(&fixture_page()).unwrap();
        let walked: Vec<(String, usize)> = tree
            .walk()
            .into_iter()
            .map(|v| (v.id.to_string(), v.depth))
            .collect();
        assert_eq!(
            walked,
            vec![
                ("intro".to_string(), 0),
                ("child".to_string(), 1),
                ("grandchild".to_string(), 2),
                ("tabs".to_string(), 0),
                ("t0".to_string(), 1),
                ("cols".to_string(), 0),
                ("c0".to_string(), 1),
                ("c1".to_string(), 1),
                ("outro".to_string(), 0),
            ]
        );
        assert_eq!(tree.depth_of(&"grandchild".into()), Some(2));
        assert_eq!(
            tree.ancestors(&"grandchild".into()),
            vec![BlockId::from("intro"), BlockId::from("child")]
        );
    }

    #[test]
    fn locate_materialises_subtree() {
        let tree = ContentTree::from_blocks(&fixture_page()).unwrap();
        let intro = tree.locate(&"intro".into()).unwrap();
        assert_eq!(intro, fixture_page()[0]);
        assert_eq!(tree.locate(&"nope".into()), None);
    }
}
