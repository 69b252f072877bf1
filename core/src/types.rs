/// Single coordinate axis used for board side length and positions.
pub type Coord = u8;

/// Flat row-major position of a cell, `y * size + x`.
pub type CellIndex = u8;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

/// Identity of the player a game belongs to.
pub type Owner = u64;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    /// Boards are stored row-major, so `y` selects the row.
    fn to_nd_index(self) -> Self::Output {
        [self.1.into(), self.0.into()]
    }
}

pub const fn index_to_position(size: Coord, index: CellIndex) -> Coord2 {
    (index % size, index / size)
}

pub const fn position_to_index(size: Coord, (x, y): Coord2) -> CellIndex {
    y * size + x
}

pub const fn cell_count(size: Coord) -> usize {
    (size as usize) * (size as usize)
}

const DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains on a `size` board.
fn apply_delta(coords: Coord2, delta: (i8, i8), size: Coord) -> Option<Coord2> {
    let (x, y) = coords;
    let (dx, dy) = delta;

    let next_x = x.checked_add_signed(dx)?;
    if next_x >= size {
        return None;
    }

    let next_y = y.checked_add_signed(dy)?;
    if next_y >= size {
        return None;
    }

    Some((next_x, next_y))
}

/// Iterates the 8-connected neighbors of a cell, clipped at the board edges.
#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    size: Coord,
    index: u8,
}

impl NeighborIter {
    pub fn new(center: CellIndex, size: Coord) -> Self {
        Self {
            center: index_to_position(size, center),
            size,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = CellIndex;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if usize::from(self.index) >= DISPLACEMENTS.len() {
                return None;
            }

            let next_item = apply_delta(self.center, DISPLACEMENTS[self.index as usize], self.size);
            self.index += 1;

            if let Some(coords) = next_item {
                return Some(position_to_index(self.size, coords));
            }
        }
    }
}
