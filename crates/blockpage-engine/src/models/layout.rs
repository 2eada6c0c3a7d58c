use std::fmt;
use std::str::FromStr;

/// Width ratio of a `"columns"` block, stored as `properties.layout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnLayout {
    Halves,
    TwoThirdsLeft,
    TwoThirdsRight,
    ThreeQuartersLeft,
    ThreeQuartersRight,
    Thirds,
    HalfLeftQuarters,
    HalfMiddleQuarters,
    HalfRightQuarters,
    Quarters,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("unknown column layout: {0:?}")]
    Unknown(String),
}

impl ColumnLayout {
    pub const ALL: [ColumnLayout; 10] = [
        ColumnLayout::Halves,
        ColumnLayout::TwoThirdsLeft,
        ColumnLayout::TwoThirdsRight,
        ColumnLayout::ThreeQuartersLeft,
        ColumnLayout::ThreeQuartersRight,
        ColumnLayout::Thirds,
        ColumnLayout::HalfLeftQuarters,
        ColumnLayout::HalfMiddleQuarters,
        ColumnLayout::HalfRightQuarters,
        ColumnLayout::Quarters,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnLayout::Halves => "1-1",
            ColumnLayout::TwoThirdsLeft => "2-1",
            ColumnLayout::TwoThirdsRight => "1-2",
            ColumnLayout::ThreeQuartersLeft => "3-1",
            ColumnLayout::ThreeQuartersRight => "1-3",
            ColumnLayout::Thirds => "1-1-1",
            ColumnLayout::HalfLeftQuarters => "2-1-1",
            ColumnLayout::HalfMiddleQuarters => "1-2-1",
            ColumnLayout::HalfRightQuarters => "1-1-2",
            ColumnLayout::Quarters => "equal-4",
        }
    }

    /// Number of column slots the layout needs.
    pub fn column_count(self) -> usize {
        self.ratios().len()
    }

    fn ratios(self) -> &'static [u32] {
        match self {
            ColumnLayout::Halves => &[1, 1],
            ColumnLayout::TwoThirdsLeft => &[2, 1],
            ColumnLayout::TwoThirdsRight => &[1, 2],
            ColumnLayout::ThreeQuartersLeft => &[3, 1],
            ColumnLayout::ThreeQuartersRight => &[1, 3],
            ColumnLayout::Thirds => &[1, 1, 1],
            ColumnLayout::HalfLeftQuarters => &[2, 1, 1],
            ColumnLayout::HalfMiddleQuarters => &[1, 2, 1],
            ColumnLayout::HalfRightQuarters => &[1, 1, 2],
            ColumnLayout::Quarters => &[1, 1, 1, 1],
        }
    }

    /// Column widths as percentages of the row.
    pub fn widths(self) -> Vec<f64> {
        let ratios = self.ratios();
        let total: u32 = ratios.iter().sum();
        ratios
            .iter()
            .map(|r| f64::from(*r) * 100.0 / f64::from(total))
            .collect()
    }
}

impl fmt::Display for ColumnLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnLayout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnLayout::ALL
            .into_iter()
            .find(|layout| layout.as_str() == s)
            .ok_or_else(|| LayoutError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1-1", 2)]
    #[case("2-1", 2)]
    #[case("1-2", 2)]
    #[case("3-1", 2)]
    #[case("1-3", 2)]
    #[case("1-1-1", 3)]
    #[case("2-1-1", 3)]
    #[case("1-2-1", 3)]
    #[case("1-1-2", 3)]
    #[case("equal-4", 4)]
    fn column_counts(#[case] layout: &str, #[case] count: usize) {
        let layout: ColumnLayout = layout.parse().unwrap();
        assert_eq!(layout.column_count(), count);
        assert_eq!(layout.widths().len(), count);
    }

    #[test]
    fn widths_follow_ratio() {
        assert_eq!(ColumnLayout::ThreeQuartersLeft.widths(), vec![75.0, 25.0]);
        assert_eq!(ColumnLayout::Quarters.widths(), vec![25.0; 4]);
    }

    #[test]
    fn unknown_layout_is_an_error() {
        assert_eq!(
            "5-1".parse::<ColumnLayout>(),
            Err(LayoutError::Unknown("5-1".to_string()))
        );
    }
}
