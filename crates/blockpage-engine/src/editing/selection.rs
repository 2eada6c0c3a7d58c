use crate::models::BlockId;

/// The block currently selected in the editing surface, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(Option<BlockId>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: BlockId) {
        self.0 = Some(id);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn get(&self) -> Option<&BlockId> {
        self.0.as_ref()
    }

    pub fn is_selected(&self, id: &BlockId) -> bool {
        self.0.as_ref() == Some(id)
    }

    /// Clear the selection if it points at one of `removed`. Returns whether
    /// it was cleared.
    pub fn clear_if_removed(&mut self, removed: &[BlockId]) -> bool {
        let hit = self.0.as_ref().is_some_and(|id| removed.contains(id));
        if hit {
            self.clear();
        }
        hit
    }
}
