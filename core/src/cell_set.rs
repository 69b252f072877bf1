use serde::{Deserialize, Serialize};

use crate::CellIndex;

/// Number of cells a [`CellSet`] can track.
pub const CELL_SET_CAPACITY: usize = u32::BITS as usize;

/// Fixed-capacity set of cell indices, bit `i` set when cell `i` is a member.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellSet(u32);

impl CellSet {
    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, index: CellIndex) -> bool {
        match Self::mask(index) {
            Some(mask) => self.0 & mask != 0,
            None => false,
        }
    }

    /// Returns whether the index was newly inserted. Indices past [`CELL_SET_CAPACITY`]
    /// are never inserted.
    pub fn insert(&mut self, index: CellIndex) -> bool {
        let Some(mask) = Self::mask(index) else {
            return false;
        };
        let inserted = self.0 & mask == 0;
        self.0 |= mask;
        inserted
    }

    /// Returns whether the index was present.
    pub fn remove(&mut self, index: CellIndex) -> bool {
        let Some(mask) = Self::mask(index) else {
            return false;
        };
        let removed = self.0 & mask != 0;
        self.0 &= !mask;
        removed
    }

    /// Flips membership, returning whether the index is now present.
    pub fn toggle(&mut self, index: CellIndex) -> bool {
        if self.remove(index) {
            false
        } else {
            self.insert(index)
        }
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every member is below `limit`.
    pub const fn is_within(self, limit: usize) -> bool {
        if limit >= CELL_SET_CAPACITY {
            true
        } else {
            self.0 >> limit == 0
        }
    }

    pub fn iter(self) -> CellSetIter {
        CellSetIter(self.0)
    }

    const fn mask(index: CellIndex) -> Option<u32> {
        if (index as usize) < CELL_SET_CAPACITY {
            Some(1 << index)
        } else {
            None
        }
    }
}

impl FromIterator<CellIndex> for CellSet {
    fn from_iter<T: IntoIterator<Item = CellIndex>>(iter: T) -> Self {
        let mut set = Self::new();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

impl IntoIterator for CellSet {
    type Item = CellIndex;
    type IntoIter = CellSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the members of a [`CellSet`].
#[derive(Debug)]
pub struct CellSetIter(u32);

impl Iterator for CellSetIter {
    type Item = CellIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(index as CellIndex)
    }
}
