use std::fmt;
use std::str::FromStr;

/// Names one nested block list attached to a block.
///
/// Every block has a `Children` slot. A `"tabs"` block additionally has one
/// `Tab(i)` slot per entry of `properties.tabs`, and a `"columns"` block one
/// `Column(i)` slot per entry of `properties.columns`.
///
/// The derived ordering (children, then tabs, then columns, each by index)
/// is the traversal order used by every tree walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKey {
    Children,
    Tab(usize),
    Column(usize),
}

/// The kind of container a block sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Root,
    Children,
    TabBlocks,
    ColumnBlocks,
}

/// Block type tag whose entries carry `Tab` slots.
pub const TABS_TYPE: &str = "tabs";
/// Block type tag whose entries carry `Column` slots.
pub const COLUMNS_TYPE: &str = "columns";

/// Which of a block's property lists holds indexed slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotFamily {
    Tabs,
    Columns,
}

impl SlotFamily {
    /// The family owned by a block type, if any.
    pub fn for_type(block_type: &str) -> Option<Self> {
        match block_type {
            TABS_TYPE => Some(SlotFamily::Tabs),
            COLUMNS_TYPE => Some(SlotFamily::Columns),
            _ => None,
        }
    }

    /// Property key holding the entry list (`"tabs"` / `"columns"`).
    pub fn property_key(self) -> &'static str {
        match self {
            SlotFamily::Tabs => "tabs",
            SlotFamily::Columns => "columns",
        }
    }

    pub fn slot(self, index: usize) -> SlotKey {
        match self {
            SlotFamily::Tabs => SlotKey::Tab(index),
            SlotFamily::Columns => SlotKey::Column(index),
        }
    }
}

impl SlotKey {
    pub fn container_kind(self) -> ContainerKind {
        match self {
            SlotKey::Children => ContainerKind::Children,
            SlotKey::Tab(_) => ContainerKind::TabBlocks,
            SlotKey::Column(_) => ContainerKind::ColumnBlocks,
        }
    }

    pub fn family(self) -> Option<SlotFamily> {
        match self {
            SlotKey::Children => None,
            SlotKey::Tab(_) => Some(SlotFamily::Tabs),
            SlotKey::Column(_) => Some(SlotFamily::Columns),
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            SlotKey::Children => None,
            SlotKey::Tab(i) | SlotKey::Column(i) => Some(i),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Children => write!(f, "children"),
            SlotKey::Tab(i) => write!(f, "tab:{i}"),
            SlotKey::Column(i) => write!(f, "column:{i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid slot key: {0:?}")]
pub struct ParseSlotKeyError(String);

impl FromStr for SlotKey {
    type Err = ParseSlotKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "children" {
            return Ok(SlotKey::Children);
        }
        let err = || ParseSlotKeyError(s.to_string());
        let (family, index) = s.split_once(':').ok_or_else(err)?;
        let index: usize = index.parse().map_err(|_| err())?;
        match family {
            "tab" => Ok(SlotKey::Tab(index)),
            "column" => Ok(SlotKey::Column(index)),
            _ => Err(err()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SlotKey::Children, "children")]
    #[case(SlotKey::Tab(0), "tab:0")]
    #[case(SlotKey::Column(12), "column:12")]
    fn display_and_parse_agree(#[case] key: SlotKey, #[case] text: &str) {
        assert_eq!(key.to_string(), text);
        assert_eq!(text.parse::<SlotKey>().unwrap(), key);
    }

    #[rstest]
    #[case("")]
    #[case("tab")]
    #[case("tab:x")]
    #[case("row:1")]
    fn rejects_garbage(#[case] text: &str) {
        assert!(text.parse::<SlotKey>().is_err());
    }

    #[test]
    fn traversal_order_is_children_tabs_columns() {
        let mut keys = vec![
            SlotKey::Column(0),
            SlotKey::Tab(1),
            SlotKey::Children,
            SlotKey::Tab(0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                SlotKey::Children,
                SlotKey::Tab(0),
                SlotKey::Tab(1),
                SlotKey::Column(0)
            ]
        );
    }
}
