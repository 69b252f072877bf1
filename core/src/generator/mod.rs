use crate::*;
pub use random::*;

mod random;

pub trait BoardGenerator {
    fn generate(self, config: GameConfig) -> GeneratedBoard;
}

/// A freshly mined board together with the zero cell shown to the player up front.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedBoard {
    pub board: Board,
    pub start: Option<CellIndex>,
}
