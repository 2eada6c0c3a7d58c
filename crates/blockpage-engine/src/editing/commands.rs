use serde_json::Value;

use crate::editing::patch::{EditOutcome, Edited, RejectReason};
use crate::editing::tree::{Container, ContentTree, TreeError, entry_metadata};
use crate::models::{
    Block, BlockId, COLUMNS_TYPE, ColumnLayout, Properties, SlotFamily, SlotKey,
};

/// Where an inserted or relocated block is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertTarget {
    Root,
    Parent(BlockId),
    TabSlot(BlockId, usize),
    ColumnSlot(BlockId, usize),
}

impl InsertTarget {
    pub fn container(&self) -> Container {
        match self {
            InsertTarget::Root => Container::Root,
            InsertTarget::Parent(parent) => Container::Slot {
                parent: parent.clone(),
                slot: SlotKey::Children,
            },
            InsertTarget::TabSlot(parent, index) => Container::Slot {
                parent: parent.clone(),
                slot: SlotKey::Tab(*index),
            },
            InsertTarget::ColumnSlot(parent, index) => Container::Slot {
                parent: parent.clone(),
                slot: SlotKey::Column(*index),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A structural edit of the content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    Insert {
        block: Block,
        target: InsertTarget,
    },
    Update {
        id: BlockId,
        properties: Properties,
    },
    Delete {
        id: BlockId,
    },
    DeleteFromTab {
        tabs_id: BlockId,
        tab_index: usize,
        id: BlockId,
    },
    DeleteFromColumn {
        columns_id: BlockId,
        column_index: usize,
        id: BlockId,
    },
    /// Swap with the adjacent root block.
    Move {
        id: BlockId,
        direction: Direction,
    },
    MoveBetweenSlots {
        id: BlockId,
        destination: InsertTarget,
    },
    ResizeColumns {
        id: BlockId,
        layout: ColumnLayout,
    },
}

impl Cmd {
    pub fn name(&self) -> &'static str {
        match self {
            Cmd::Insert { .. } => "insert",
            Cmd::Update { .. } => "update",
            Cmd::Delete { .. } => "delete",
            Cmd::DeleteFromTab { .. } => "delete_from_tab",
            Cmd::DeleteFromColumn { .. } => "delete_from_column",
            Cmd::Move { .. } => "move",
            Cmd::MoveBetweenSlots { .. } => "move_between_slots",
            Cmd::ResizeColumns { .. } => "resize_columns",
        }
    }
}

impl ContentTree {
    pub fn apply(&self, cmd: Cmd) -> Edited {
        match cmd {
            Cmd::Insert { block, target } => self.insert(block, &target),
            Cmd::Update { id, properties } => self.update(&id, properties),
            Cmd::Delete { id } => self.delete(&id),
            Cmd::DeleteFromTab {
                tabs_id,
                tab_index,
                id,
            } => self.delete_from_tab(&tabs_id, tab_index, &id),
            Cmd::DeleteFromColumn {
                columns_id,
                column_index,
                id,
            } => self.delete_from_column(&columns_id, column_index, &id),
            Cmd::Move { id, direction } => self.move_block(&id, direction),
            Cmd::MoveBetweenSlots { id, destination } => self.move_between_slots(&id, &destination),
            Cmd::ResizeColumns { id, layout } => self.resize_columns(&id, layout),
        }
    }

    /// Append `block` (with its whole subtree) to `target`.
    ///
    /// `order` is stamped with the block's position in its new container.
    pub fn insert(&self, mut block: Block, target: &InsertTarget) -> Edited {
        let container = target.container();
        if let Some(outcome) = self.check_container(&container) {
            return Edited::unchanged(self, outcome);
        }

        let mut next = self.clone();
        block.order = self.container(&container).map_or(0, |list| list.len() as i64);
        let id = match next.absorb(&block) {
            Ok(id) => id,
            Err(TreeError::DuplicateId(id)) => {
                return Edited::unchanged(self, EditOutcome::Rejected(RejectReason::DuplicateId(id)));
            }
            Err(err @ TreeError::MalformedSlot { .. }) => {
                return Edited::unchanged(
                    self,
                    EditOutcome::Rejected(RejectReason::MalformedBlock(err.to_string())),
                );
            }
        };
        if let Some(list) = next.container_mut(&container) {
            list.push(id);
        }
        Edited::applied(next, Vec::new())
    }

    /// Shallow-merge `partial` into the block's properties.
    ///
    /// For a tabs/columns block the `tabs`/`columns` key replaces entry
    /// metadata only; nested `blocks` in the partial entries are ignored and
    /// the existing slots are kept by position. Slots beyond a shorter list
    /// are dropped with their blocks.
    pub fn update(&self, id: &BlockId, partial: Properties) -> Edited {
        let Some(node) = self.node(id) else {
            return Edited::unchanged(self, EditOutcome::NotFound);
        };
        let family = SlotFamily::for_type(&node.block_type);
        let slot_key = family.map(SlotFamily::property_key);

        if let Some(key) = slot_key
            && partial.get(key).is_some_and(|value| !value.is_array())
        {
            return Edited::unchanged(self, EditOutcome::Rejected(RejectReason::InvalidSlotList(key)));
        }

        let columns = matches!(family, Some(SlotFamily::Columns));
        let new_layout = match partial.get("layout") {
            Some(value) if columns => match value.as_str().map(str::parse::<ColumnLayout>) {
                Some(Ok(layout)) => Some(layout),
                _ => {
                    let shown = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                    let reason = RejectReason::InvalidLayout(shown);
                    return Edited::unchanged(self, EditOutcome::Rejected(reason));
                }
            },
            _ => None,
        };
        if columns
            && let Some(entries) = partial.get(SlotFamily::Columns.property_key()).and_then(Value::as_array)
            && let Some(layout) =
                new_layout.or_else(|| node.str_prop("layout").and_then(|layout| layout.parse().ok()))
            && entries.len() != layout.column_count()
        {
            let reason = RejectReason::ColumnCountMismatch {
                layout,
                found: entries.len(),
            };
            return Edited::unchanged(self, EditOutcome::Rejected(reason));
        }

        let mut next = self.clone();
        let mut resized = None;
        if let Some(node) = next.node_mut(id) {
            for (key, value) in partial {
                match value {
                    Value::Array(entries) if Some(key.as_str()) == slot_key => {
                        resized = Some(entries.len());
                        let entries = entries.into_iter().map(entry_metadata).collect();
                        node.properties.insert(key, Value::Array(entries));
                    }
                    value => {
                        node.properties.insert(key, value);
                    }
                }
            }
        }

        let removed = match (family, new_layout, resized) {
            (_, Some(layout), _) => next.reshape_columns(id, layout),
            (Some(family), None, Some(count)) => next.fit_slots(id, family, count),
            _ => Vec::new(),
        };
        Edited::applied(next, removed)
    }

    /// Remove the block from whichever container holds it.
    pub fn delete(&self, id: &BlockId) -> Edited {
        let Some(location) = self.locate_parent(id) else {
            return Edited::unchanged(self, EditOutcome::NotFound);
        };
        let mut next = self.clone();
        if let Some(list) = next.container_mut(&location.container) {
            list.remove(location.index);
        }
        let removed = next.remove_subtree(id);
        Edited::applied(next, removed)
    }

    /// Remove `id` only if it sits directly in tab `tab_index` of `tabs_id`.
    pub fn delete_from_tab(&self, tabs_id: &BlockId, tab_index: usize, id: &BlockId) -> Edited {
        self.delete_from_slot(tabs_id, SlotKey::Tab(tab_index), id)
    }

    /// Remove `id` only if it sits directly in column `column_index` of `columns_id`.
    pub fn delete_from_column(
        &self,
        columns_id: &BlockId,
        column_index: usize,
        id: &BlockId,
    ) -> Edited {
        self.delete_from_slot(columns_id, SlotKey::Column(column_index), id)
    }

    fn delete_from_slot(&self, parent: &BlockId, slot: SlotKey, id: &BlockId) -> Edited {
        let container = Container::Slot {
            parent: parent.clone(),
            slot,
        };
        if let Some(outcome) = self.check_container(&container) {
            return Edited::unchanged(self, outcome);
        }
        let Some(index) = self
            .container(&container)
            .and_then(|list| list.iter().position(|candidate| candidate == id))
        else {
            return Edited::unchanged(self, EditOutcome::NotFound);
        };

        let mut next = self.clone();
        if let Some(list) = next.container_mut(&container) {
            list.remove(index);
        }
        let removed = next.remove_subtree(id);
        Edited::applied(next, removed)
    }

    /// Swap a root block with its neighbour. Moving past either end leaves
    /// the list as it is and reports `OutOfRange`.
    pub fn move_block(&self, id: &BlockId, direction: Direction) -> Edited {
        let Some(index) = self.root.iter().position(|candidate| candidate == id) else {
            let outcome = if self.contains(id) {
                EditOutcome::Rejected(RejectReason::NotInRootList)
            } else {
                EditOutcome::NotFound
            };
            return Edited::unchanged(self, outcome);
        };
        let neighbour = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|i| *i < self.root.len()),
        };
        let Some(neighbour) = neighbour else {
            return Edited::unchanged(self, EditOutcome::OutOfRange);
        };

        let mut next = self.clone();
        if let Some(list) = next.container_mut(&Container::Root) {
            list.swap(index, neighbour);
        }
        Edited::applied(next, Vec::new())
    }

    /// Relocate a block with its subtree to the end of `destination` in one
    /// step. Nothing changes unless both ends are valid.
    pub fn move_between_slots(&self, id: &BlockId, destination: &InsertTarget) -> Edited {
        let Some(source) = self.locate_parent(id) else {
            return Edited::unchanged(self, EditOutcome::NotFound);
        };
        let target = destination.container();
        if let Some(outcome) = self.check_container(&target) {
            return Edited::unchanged(self, outcome);
        }
        if let Some(parent) = target.parent()
            && (parent == id || self.ancestors(parent).contains(id))
        {
            return Edited::unchanged(self, EditOutcome::Rejected(RejectReason::IntoOwnSubtree));
        }

        let mut next = self.clone();
        if let Some(list) = next.container_mut(&source.container) {
            list.remove(source.index);
        }
        let order = next.container(&target).map_or(0, |list| list.len() as i64);
        if let Some(node) = next.node_mut(id) {
            node.order = order;
        }
        if let Some(list) = next.container_mut(&target) {
            list.push(id.clone());
        }
        Edited::applied(next, Vec::new())
    }

    /// Set a columns block's layout and fit its column slots to it.
    ///
    /// Retained columns keep their blocks by position; columns past the new
    /// count are dropped with their blocks (see [`ContentTree::columns_to_drop`]).
    pub fn resize_columns(&self, id: &BlockId, layout: ColumnLayout) -> Edited {
        let Some(node) = self.node(id) else {
            return Edited::unchanged(self, EditOutcome::NotFound);
        };
        if node.block_type != COLUMNS_TYPE {
            let reason = RejectReason::WrongType {
                expected: COLUMNS_TYPE,
                found: node.block_type.clone(),
            };
            return Edited::unchanged(self, EditOutcome::Rejected(reason));
        }

        let mut next = self.clone();
        let removed = next.reshape_columns(id, layout);
        Edited::applied(next, removed)
    }

    /// How many non-empty columns resizing `id` to `layout` would discard.
    pub fn columns_to_drop(&self, id: &BlockId, layout: ColumnLayout) -> usize {
        let Some(node) = self.node(id).filter(|node| node.block_type == COLUMNS_TYPE) else {
            return 0;
        };
        node.slots
            .iter()
            .filter(|(key, ids)| {
                matches!(key, SlotKey::Column(i) if *i >= layout.column_count()) && !ids.is_empty()
            })
            .count()
    }

    /// `None` when `container` can take a block, otherwise the outcome to
    /// report.
    fn check_container(&self, container: &Container) -> Option<EditOutcome> {
        match container {
            Container::Root => None,
            Container::Slot { parent, slot } => match self.node(parent) {
                None => Some(EditOutcome::NotFound),
                Some(node) if node.slot(*slot).is_none() => Some(EditOutcome::OutOfRange),
                Some(_) => None,
            },
        }
    }

    /// Set the layout of columns block `id`, padding or truncating its
    /// column list and slots to match.
    fn reshape_columns(&mut self, id: &BlockId, layout: ColumnLayout) -> Vec<BlockId> {
        let count = layout.column_count();
        let key = SlotFamily::Columns.property_key();
        if let Some(node) = self.node_mut(id) {
            let mut columns = node
                .properties
                .get(key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            columns.resize_with(count, || Value::Object(Default::default()));
            node.properties.insert(key.to_string(), Value::Array(columns));
            node.properties
                .insert("layout".to_string(), Value::String(layout.to_string()));
        }
        self.fit_slots(id, SlotFamily::Columns, count)
    }

    /// Make `id` own exactly `count` slots of `family`, dropping the blocks
    /// of any slot past the end. Returns the removed ids.
    pub(crate) fn fit_slots(&mut self, id: &BlockId, family: SlotFamily, count: usize) -> Vec<BlockId> {
        let mut dropped = Vec::new();
        if let Some(node) = self.node_mut(id) {
            let stale: Vec<SlotKey> = node
                .slots
                .keys()
                .filter(|key| key.family() == Some(family) && key.index().is_some_and(|i| i >= count))
                .copied()
                .collect();
            for key in stale {
                dropped.extend(node.slots.remove(&key).unwrap_or_default());
            }
            for index in 0..count {
                node.slots.entry(family.slot(index)).or_default();
            }
        }
        dropped
            .iter()
            .flat_map(|child| self.remove_subtree(child))
            .collect()
    }
}
