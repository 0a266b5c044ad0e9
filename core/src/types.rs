use serde::{Deserialize, Serialize};

/// Single coordinate axis used for board rows, columns, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(row, col)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Iterates every cell of a `rows x cols` board in row-major order.
pub fn iter_cells((rows, cols): Coord2) -> impl Iterator<Item = Coord2> {
    (0..rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
}

/// Neighbors of `center` inside a board of size `bounds`.
pub fn neighbors(center: Coord2, bounds: Coord2) -> NeighborIter {
    NeighborIter::new(center, bounds)
}

// Row-major order, so breadth-first expansion visits neighbors top-left first.
const DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (i8, i8), bounds: Coord2) -> Option<Coord2> {
    let (row, col) = coords;
    let (d_row, d_col) = delta;
    let (rows, cols) = bounds;

    let next_row = row.checked_add_signed(d_row)?;
    if next_row >= rows {
        return None;
    }

    let next_col = col.checked_add_signed(d_col)?;
    if next_col >= cols {
        return None;
    }

    Some((next_row, next_col))
}

#[derive(Debug, Clone)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&delta) = DISPLACEMENTS.get(usize::from(self.index)) {
            self.index += 1;
            if let Some(next_item) = apply_delta(self.center, delta, self.bounds) {
                return Some(next_item);
            }
        }
        None
    }
}

/// Inclusive rectangle of cells, as sent to clients for area hints.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRect {
    pub row_start: Coord,
    pub col_start: Coord,
    pub row_end: Coord,
    pub col_end: Coord,
}

impl CellRect {
    /// The 3x3 block centered on `center`, clipped to a board of size `bounds`.
    pub fn around(center: Coord2, bounds: Coord2) -> Self {
        let (row, col) = center;
        let last_row = bounds.0.saturating_sub(1);
        let last_col = bounds.1.saturating_sub(1);
        Self {
            row_start: row.saturating_sub(1).min(last_row),
            col_start: col.saturating_sub(1).min(last_col),
            row_end: row.saturating_add(1).min(last_row),
            col_end: col.saturating_add(1).min(last_col),
        }
    }

    pub fn contains(&self, (row, col): Coord2) -> bool {
        (self.row_start..=self.row_end).contains(&row)
            && (self.col_start..=self.col_end).contains(&col)
    }
}
