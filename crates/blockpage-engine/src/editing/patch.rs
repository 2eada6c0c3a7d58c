use crate::editing::tree::ContentTree;
use crate::models::{BlockId, ColumnLayout};

/// Why an edit was refused outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The inserted subtree reuses an id already present in the page (or
    /// repeats one internally).
    DuplicateId(BlockId),
    /// The inserted subtree has a tabs/columns list that is not a list of
    /// block lists.
    MalformedBlock(String),
    /// A block cannot be moved into itself or one of its descendants.
    IntoOwnSubtree,
    /// Up/down reordering only applies to root blocks.
    NotInRootList,
    WrongType {
        expected: &'static str,
        found: String,
    },
    /// An update supplied something other than a list for `tabs`/`columns`.
    InvalidSlotList(&'static str),
    /// An update set a columns block's `layout` to something unrecognised.
    InvalidLayout(String),
    /// An update supplied a `columns` list whose length disagrees with the
    /// block's layout.
    ColumnCountMismatch {
        layout: ColumnLayout,
        found: usize,
    },
}

/// What happened to an edit.
///
/// Editing is lenient: a stale id or index leaves the page as it was rather
/// than failing. The outcome tells callers and tests which case they hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    NotFound,
    OutOfRange,
    Rejected(RejectReason),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied)
    }
}

/// A tree produced by an edit, plus what the edit did.
///
/// When `outcome` is anything but `Applied`, `tree` is the input tree.
#[derive(Debug, Clone)]
pub struct Edited {
    pub tree: ContentTree,
    pub outcome: EditOutcome,
    /// Every block id that left the tree, deleted block first.
    pub removed: Vec<BlockId>,
}

impl Edited {
    pub(crate) fn applied(tree: ContentTree, removed: Vec<BlockId>) -> Self {
        Self {
            tree,
            outcome: EditOutcome::Applied,
            removed,
        }
    }

    pub(crate) fn unchanged(tree: &ContentTree, outcome: EditOutcome) -> Self {
        Self {
            tree: tree.clone(),
            outcome,
            removed: Vec::new(),
        }
    }
}

/// Result of applying a command through a [`PageEditor`](crate::editing::PageEditor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub outcome: EditOutcome,
    pub removed: Vec<BlockId>,
    pub version: u64,
    /// Whether the edit removed the selected block or one of its ancestors.
    pub selection_cleared: bool,
}
