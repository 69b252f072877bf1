#![no_std]

extern crate alloc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell_set::*;
pub use codec::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use tile::*;
pub use types::*;

mod cell_set;
mod codec;
mod engine;
mod error;
mod generator;
mod tile;
mod types;

/// Largest board side whose cells all fit in a [`CellSet`].
pub const MAX_SIZE: Coord = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord) -> Self {
        Self { size }
    }

    pub fn new(size: Coord) -> Result<Self> {
        if size == 0 || cell_count(size) > CELL_SET_CAPACITY {
            return Err(GameError::InvalidSize { max: MAX_SIZE });
        }
        Ok(Self::new_unchecked(size))
    }

    /// One mine per unit of side length.
    pub const fn mines(&self) -> usize {
        self.size as usize
    }

    pub const fn total_cells(&self) -> usize {
        cell_count(self.size)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new_unchecked(MAX_SIZE)
    }
}

/// Immutable cell values of a square board: adjacency counts `0..=8`, or [`MINE`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Board {
    cells: Array2<u8>,
}

impl Board {
    pub fn from_mine_indices(config: GameConfig, mines: &[CellIndex]) -> Result<Self> {
        let mut mine_set = CellSet::new();
        for &index in mines {
            if usize::from(index) >= config.total_cells() {
                return Err(GameError::OutOfRange);
            }
            mine_set.insert(index);
        }
        Ok(Self::with_mines(config, mine_set))
    }

    /// Rebuilds a board from its stored values, checking that every count agrees with
    /// the mines around it.
    pub fn from_cells(config: GameConfig, values: &[u8]) -> Result<Self> {
        if values.len() != config.total_cells() {
            return Err(GameError::Malformed("cell count does not match board size"));
        }
        if values.iter().any(|&value| value > MINE) {
            return Err(GameError::Malformed("cell value out of range"));
        }

        let mines: CellSet = (0..values.len())
            .filter(|&index| values[index] == MINE)
            .map(|index| index as CellIndex)
            .collect();
        let board = Self::with_mines(config, mines);
        if !board.cells.iter().eq(values.iter()) {
            return Err(GameError::Malformed("adjacency counts disagree with mines"));
        }
        Ok(board)
    }

    pub(crate) fn with_mines(config: GameConfig, mines: CellSet) -> Self {
        let size = config.size;
        let mut cells: Array2<u8> = Array2::default([usize::from(size); 2]);

        for index in 0..config.total_cells() as CellIndex {
            let value = if mines.contains(index) {
                MINE
            } else {
                NeighborIter::new(index, size)
                    .filter(|&pos| mines.contains(pos))
                    .count() as u8
            };
            cells[index_to_position(size, index).to_nd_index()] = value;
        }

        Self { cells }
    }

    pub fn size(&self) -> Coord {
        self.cells.nrows() as Coord
    }

    pub fn config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.size())
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn mine_count(&self) -> usize {
        self.cells.iter().filter(|&&value| value == MINE).count()
    }

    pub fn safe_cell_count(&self) -> usize {
        self.total_cells() - self.mine_count()
    }

    pub fn validate_index(&self, index: CellIndex) -> Result<CellIndex> {
        if usize::from(index) < self.total_cells() {
            Ok(index)
        } else {
            Err(GameError::OutOfRange)
        }
    }

    pub fn value_at(&self, index: CellIndex) -> u8 {
        self.cells[index_to_position(self.size(), index).to_nd_index()]
    }

    pub fn is_mine(&self, index: CellIndex) -> bool {
        self.value_at(index) == MINE
    }

    pub fn adjacent_mine_count(&self, index: CellIndex) -> u8 {
        self.iter_neighbors(index)
            .filter(|&pos| self.is_mine(pos))
            .count() as u8
    }

    pub fn iter_neighbors(&self, index: CellIndex) -> NeighborIter {
        NeighborIter::new(index, self.size())
    }

    /// Cell values in index order.
    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.cells.iter().copied()
    }

    pub fn indices(&self) -> impl Iterator<Item = CellIndex> + use<> {
        0..self.total_cells() as CellIndex
    }
}

/// Result of a single click on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    NoChange,
    FlagChanged,
    Revealed,
    HitMine,
    Won,
}

impl ClickOutcome {
    pub const fn has_update(self) -> bool {
        use ClickOutcome::*;
        match self {
            NoChange => false,
            FlagChanged => true,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }
}
