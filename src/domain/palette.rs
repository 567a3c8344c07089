//! Series colours.

use solstate_api_types::DimensionColor;

/// Palette cycled across dimensions ranked by total value.
pub const DEFAULT_PALETTE: &[&str] = &[
    "#14F195", "#9945FF", "#19D3F3", "#F5A623", "#FF6B6B", "#4D96FF", "#C77DFF", "#FFD93D",
    "#6BCB77", "#FF8FAB",
];

/// Dimension → colour mapping in rank order (largest total first).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DimensionColorAssignment {
    entries: Vec<(String, String)>,
}

impl DimensionColorAssignment {
    pub(crate) fn from_ranked(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    pub fn color_of(&self, dimension: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|(_, color)| color.as_str())
    }

    /// Dimensions in rank order.
    pub fn ranked_dimensions(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_api(&self) -> Vec<DimensionColor> {
        self.entries
            .iter()
            .map(|(dimension, color)| DimensionColor {
                dimension: dimension.clone(),
                color: color.clone(),
            })
            .collect()
    }
}
