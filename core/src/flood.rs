use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// A cell that became visible, with the count shown on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedCell {
    pub row: Coord,
    pub col: Coord,
    pub adjacent_mines: u8,
}

impl OpenedCell {
    pub const fn new((row, col): Coord2, adjacent_mines: u8) -> Self {
        Self {
            row,
            col,
            adjacent_mines,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        (self.row, self.col)
    }
}

/// Breadth-first reveal from `origin`.
///
/// Every cell taken off the queue is recorded in `opened`, which is shared by all reveals of
/// one replay: cells already in it are neither reported nor expanded again. Only cells with no
/// adjacent mines propagate to their neighbors, and mines are never queued.
///
/// Errors mean the grid or the origin is inconsistent with the board, which replay treats as
/// fatal.
pub fn flood_open(
    grid: &SolutionGrid,
    origin: Coord2,
    opened: &mut BTreeSet<Coord2>,
) -> Result<Vec<OpenedCell>> {
    if grid.size().0 == 0 {
        log::error!("Flood fill on a grid without rows");
        return Err(GameError::EmptyGrid);
    }

    let mut result = Vec::new();
    let mut to_visit = VecDeque::from([origin]);

    while let Some(coords) = to_visit.pop_front() {
        if opened.contains(&coords) {
            continue;
        }

        let Some(cell) = grid.get(coords) else {
            log::error!("Flood fill reached {:?}, outside the {:?} grid", coords, grid.size());
            return Err(GameError::CellOutOfGrid {
                row: coords.0.into(),
                col: coords.1.into(),
            });
        };

        opened.insert(coords);
        result.push(OpenedCell::new(coords, cell.adjacent_mines));
        log::trace!("Flood opened {:?}, adjacent mines: {}", coords, cell.adjacent_mines);

        if cell.is_mine || cell.adjacent_mines > 0 {
            continue;
        }

        to_visit.extend(
            grid.iter_neighbors(coords)
                .filter(|pos| !opened.contains(pos))
                .filter(|&pos| !grid[pos].is_mine),
        );
    }

    log::trace!("Flood from {:?} opened {} cells", origin, result.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_zero_region_and_its_border() {
        // . . 1 *
        // . . 1 1
        // . . . .
        let grid = SolutionGrid::build((3, 4), &[(0, 3)]);
        let mut opened = BTreeSet::new();

        let cells = flood_open(&grid, (2, 0), &mut opened).unwrap();

        assert_eq!(cells.len(), 11);
        assert!(!opened.contains(&(0, 3)));
        assert_eq!(cells[0], OpenedCell::new((2, 0), 0));
        assert!(cells.contains(&OpenedCell::new((0, 2), 1)));
    }

    #[test]
    fn numbered_origin_opens_only_itself() {
        let grid = SolutionGrid::build((3, 3), &[(0, 0)]);
        let mut opened = BTreeSet::new();

        let cells = flood_open(&grid, (1, 1), &mut opened).unwrap();

        assert_eq!(cells, vec![OpenedCell::new((1, 1), 1)]);
    }

    #[test]
    fn shared_opened_set_prevents_double_counting() {
        let grid = SolutionGrid::build((3, 4), &[(0, 3)]);
        let mut opened = BTreeSet::new();

        let first = flood_open(&grid, (0, 2), &mut opened).unwrap();
        let second = flood_open(&grid, (2, 0), &mut opened).unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 10);
        assert!(!second.contains(&OpenedCell::new((0, 2), 1)));
        assert!(flood_open(&grid, (1, 1), &mut opened).unwrap().is_empty());
    }

    #[test]
    fn empty_grid_is_an_invariant_violation() {
        let grid = SolutionGrid::build((0, 0), &[]);
        let err = flood_open(&grid, (0, 0), &mut BTreeSet::new()).unwrap_err();
        assert_eq!(err, GameError::EmptyGrid);
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn origin_outside_grid_is_an_invariant_violation() {
        let grid = SolutionGrid::build((2, 2), &[]);
        let err = flood_open(&grid, (4, 0), &mut BTreeSet::new()).unwrap_err();
        assert_eq!(err, GameError::CellOutOfGrid { row: 4, col: 0 });
    }
}
