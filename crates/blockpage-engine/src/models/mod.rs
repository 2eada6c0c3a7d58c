pub mod block;
pub mod layout;
pub mod page;
pub mod slot;

pub use block::{Block, BlockId, Properties, entry_blocks};
pub use layout::{ColumnLayout, LayoutError};
pub use page::{Page, PageCategory, PageStatus, Seo, slugify};
pub use slot::{COLUMNS_TYPE, ContainerKind, ParseSlotKeyError, SlotFamily, SlotKey, TABS_TYPE};
