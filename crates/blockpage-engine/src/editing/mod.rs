/*!
 * # Editing
 *
 * Structural editing of a page's blocks.
 *
 * ## Model
 *
 * A page is a tree of typed blocks nested three ways: the generic
 * `children` list every block has, the per-tab block lists of a `"tabs"`
 * block and the per-column lists of a `"columns"` block. While editing, the
 * tree lives in a [`ContentTree`]: an arena of nodes keyed by block id where
 * every nested list is a slot named by a [`SlotKey`](crate::models::SlotKey).
 * One traversal covers all three kinds of nesting.
 *
 * ## Edits
 *
 * Every edit is a [`Cmd`] and is pure: the input tree is left alone and a
 * new tree comes back in an [`Edited`]. Nodes off the edited path are shared
 * between the two trees.
 *
 * Edits are lenient. A stale id or an index past the end of a tab or column
 * list leaves the tree as it was, and the [`EditOutcome`] says which case
 * was hit (`NotFound`, `OutOfRange`, `Rejected`).
 *
 * ## Session
 *
 * [`PageEditor`] holds one page open for editing: metadata, tree, the
 * selected block and a version counter. It clears the selection when the
 * selected block leaves the page.
 *
 * ```rust
 * use blockpage_engine::editing::{Cmd, InsertTarget, PageEditor};
 * use blockpage_engine::models::Page;
 * use blockpage_engine::registry::BlockTypeRegistry;
 *
 * let registry = BlockTypeRegistry::builtin();
 * let mut editor = PageEditor::open(Page::new("Sixth Form")).unwrap();
 *
 * let (id, patch) = editor
 *     .add_block(&registry, "columns", InsertTarget::Root)
 *     .unwrap();
 * assert!(patch.outcome.is_applied());
 *
 * editor.add_block(&registry, "text", InsertTarget::ColumnSlot(id.clone(), 1));
 * let patch = editor.apply(Cmd::Delete { id });
 * assert_eq!(patch.removed.len(), 2);
 * assert!(editor.page().blocks.is_empty());
 * ```
 */

pub mod commands;
pub mod document;
pub mod patch;
pub mod selection;
pub mod tree;

pub use commands::{Cmd, Direction, InsertTarget};
pub use document::{DEFAULT_MAX_DISPLAY_DEPTH, OutlineRow, PageEditor};
pub use patch::{EditOutcome, Edited, Patch, RejectReason};
pub use selection::Selection;
pub use tree::{Container, ContentTree, Location, Node, TreeError, Visit};
