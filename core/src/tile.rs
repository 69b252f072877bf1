use serde::{Deserialize, Serialize};

/// Stored value of a mined cell; values below it are adjacency counts.
pub const MINE: u8 = 9;

/// What the player is shown for a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Hidden,
    Flagged,
    Revealed(u8),
    Mine,
}

impl CellView {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }
}

impl Default for CellView {
    fn default() -> Self {
        Self::Hidden
    }
}
