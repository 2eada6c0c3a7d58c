use log::{debug, warn};

use blockpage_markup::parse_fragment;

use crate::editing::{
    Cmd, Container, ContentTree, Edited, InsertTarget, Patch, Selection, TreeError,
};
use crate::import::{ImportError, import_markdown, import_markup};
use crate::models::{Block, BlockId, Page, PageCategory, PageStatus, Seo, SlotKey};
use crate::registry::BlockTypeRegistry;
use crate::render::{RenderOutput, Renderer};

/// Nesting depth editors show before collapsing a subtree.
pub const DEFAULT_MAX_DISPLAY_DEPTH: usize = 5;

const SUMMARY_KEYS: &[&str] = &["text", "content", "label", "quote", "title", "src"];
const SUMMARY_LEN: usize = 40;

/// One editing session over a page.
///
/// Holds the page metadata, its blocks as a [`ContentTree`], the selected
/// block and a version counter bumped by every change. Structural edits go
/// through [`PageEditor::apply`]; [`PageEditor::page`] gives back the
/// document to save.
#[derive(Debug, Clone)]
pub struct PageEditor {
    /// Metadata; `page.blocks` is only brought up to date by [`PageEditor::page`].
    page: Page,
    tree: ContentTree,
    selection: Selection,
    version: u64,
    max_display_depth: usize,
}

/// A row of the editor's outline of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub id: BlockId,
    pub block_type: String,
    /// Slot of the parent the block sits in; `None` for root blocks.
    pub slot: Option<SlotKey>,
    pub depth: usize,
    pub summary: String,
    /// Descendants not listed because they are nested too deep.
    pub hidden: usize,
}

impl PageEditor {
    pub fn open(mut page: Page) -> Result<Self, TreeError> {
        let tree = ContentTree::from_blocks(&page.blocks)?;
        page.blocks = Vec::new();
        Ok(Self {
            page,
            tree,
            selection: Selection::new(),
            version: 0,
            max_display_depth: DEFAULT_MAX_DISPLAY_DEPTH,
        })
    }

    pub fn with_max_display_depth(mut self, depth: usize) -> Self {
        self.max_display_depth = depth.max(1);
        self
    }

    /// Apply a structural edit. Anything but `Applied` leaves the page as
    /// it was.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let name = cmd.name();
        let edited = self.tree.apply(cmd);
        self.commit(name, edited)
    }

    fn commit(&mut self, name: &str, edited: Edited) -> Patch {
        let Edited {
            tree,
            outcome,
            removed,
        } = edited;
        if outcome.is_applied() {
            self.tree = tree;
            self.version += 1;
            debug!(
                "{name} applied (version {}, {} blocks removed)",
                self.version,
                removed.len()
            );
        } else {
            warn!("{name} left the page unchanged: {outcome:?}");
        }
        let selection_cleared = self.selection.clear_if_removed(&removed);
        Patch {
            outcome,
            removed,
            version: self.version,
            selection_cleared,
        }
    }

    /// Create a block of type `tag` from the registry defaults and append it
    /// to `target`. `None` when the type is not registered.
    pub fn add_block(
        &mut self,
        registry: &BlockTypeRegistry,
        tag: &str,
        target: InsertTarget,
    ) -> Option<(BlockId, Patch)> {
        let block = registry.create_block(tag)?;
        let id = block.id.clone();
        Some((id, self.apply(Cmd::Insert { block, target })))
    }

    /// Import a markup fragment and append the blocks to the root list.
    /// Nothing is appended unless the whole import succeeds.
    pub fn import_markup(
        &mut self,
        registry: &BlockTypeRegistry,
        fragment: &str,
    ) -> Result<Patch, ImportError> {
        let blocks = import_markup(registry, fragment)?;
        Ok(self.append_all(blocks))
    }

    pub fn import_markdown(
        &mut self,
        registry: &BlockTypeRegistry,
        source: &str,
    ) -> Result<Patch, ImportError> {
        let blocks = import_markdown(registry, source)?;
        Ok(self.append_all(blocks))
    }

    fn append_all(&mut self, blocks: Vec<Block>) -> Patch {
        let mut scratch = self.tree.clone();
        for block in blocks {
            let edited = scratch.insert(block, &InsertTarget::Root);
            if !edited.outcome.is_applied() {
                return self.commit("import", Edited::unchanged(&self.tree, edited.outcome));
            }
            scratch = edited.tree;
        }
        self.commit("import", Edited::applied(scratch, Vec::new()))
    }

    /// The page document with the current blocks.
    pub fn page(&self) -> Page {
        let mut page = self.page.clone();
        page.blocks = self.tree.to_blocks();
        page
    }

    pub fn into_page(self) -> Page {
        let mut page = self.page;
        page.blocks = self.tree.to_blocks();
        page
    }

    pub fn title(&self) -> &str {
        &self.page.title
    }

    pub fn slug(&self) -> &str {
        &self.page.slug
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.page.set_title(title);
        self.version += 1;
    }

    pub fn set_slug(&mut self, slug: impl Into<String>) {
        self.page.set_slug(slug);
        self.version += 1;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.page.description = description.into();
        self.version += 1;
    }

    pub fn set_status(&mut self, status: PageStatus) {
        self.page.status = status;
        self.version += 1;
    }

    pub fn set_category(&mut self, category: PageCategory) {
        self.page.category = category;
        self.version += 1;
    }

    pub fn seo_mut(&mut self) -> &mut Seo {
        self.version += 1;
        &mut self.page.seo
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Select `id` if it is on the page.
    pub fn select(&mut self, id: &BlockId) -> bool {
        if self.tree.contains(id) {
            self.selection.select(id.clone());
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn max_display_depth(&self) -> usize {
        self.max_display_depth
    }

    /// The page as depth-first rows. Blocks nested `max_display_depth` or
    /// deeper are left out and counted on their closest listed ancestor.
    pub fn outline(&self) -> Vec<OutlineRow> {
        self.tree
            .walk()
            .into_iter()
            .filter(|visit| visit.depth < self.max_display_depth)
            .filter_map(|visit| {
                let node = self.tree.node(&visit.id)?;
                let hidden = if visit.depth + 1 >= self.max_display_depth {
                    self.tree.subtree_ids(&visit.id).len() - 1
                } else {
                    0
                };
                let slot = match visit.location.container {
                    Container::Root => None,
                    Container::Slot { slot, .. } => Some(slot),
                };
                Some(OutlineRow {
                    id: visit.id,
                    block_type: node.block_type.clone(),
                    slot,
                    depth: visit.depth,
                    summary: summarise(
                        SUMMARY_KEYS
                            .iter()
                            .find_map(|key| node.str_prop(key).filter(|value| !value.is_empty()))
                            .unwrap_or_default(),
                    ),
                    hidden,
                })
            })
            .collect()
    }

    pub fn render(&self, registry: &BlockTypeRegistry) -> RenderOutput {
        Renderer::new(registry).render_tree(&self.tree)
    }

    /// Render one block and its subtree.
    pub fn render_block(&self, registry: &BlockTypeRegistry, id: &BlockId) -> Option<RenderOutput> {
        let block = self.tree.locate(id)?;
        Some(Renderer::new(registry).render(&[block]))
    }
}

/// Visible text of a property value, cut to a short single line.
fn summarise(value: &str) -> String {
    let text = if value.contains('<') {
        parse_fragment(value)
            .map(|nodes| nodes.iter().map(|node| node.text_content()).collect::<String>())
            .unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    };
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() > SUMMARY_LEN {
        let cut: String = line.chars().take(SUMMARY_LEN - 1).collect();
        format!("{cut}…")
    } else {
        line
    }
}
