use alloc::string::String;
use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Secret per-cell truth: whether it holds a mine and how many neighbors do.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionCell {
    pub is_mine: bool,
    /// Mines among the 8 neighbors; always 0 for a mine cell.
    pub adjacent_mines: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolutionGrid {
    size: Coord2,
    cells: Array2<SolutionCell>,
    mine_count: CellCount,
}

impl SolutionGrid {
    /// Builds the grid for `mines`. Positions outside the board are logged and skipped.
    pub fn build(size: Coord2, mines: &[Coord2]) -> Self {
        let mut cells: Array2<SolutionCell> = Array2::default(size.to_nd_index());
        let mut mine_count: CellCount = 0;

        for &coords in mines {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                log::warn!("Mine at {:?} is outside the {:?} board, ignored", coords, size);
                continue;
            }
            let cell = &mut cells[coords.to_nd_index()];
            if !cell.is_mine {
                cell.is_mine = true;
                mine_count += 1;
            }
        }

        for coords in iter_cells(size) {
            if cells[coords.to_nd_index()].is_mine {
                continue;
            }
            let count = neighbors(coords, size)
                .filter(|&pos| cells[pos.to_nd_index()].is_mine)
                .count();
            // at most 8 neighbors
            cells[coords.to_nd_index()].adjacent_mines = count as u8;
        }

        let grid = Self {
            size,
            cells,
            mine_count,
        };
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Solution grid {}x{}:\n{}", size.0, size.1, grid.render());
        }
        grid
    }

    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        mult(self.size.0, self.size.1) - self.mine_count
    }

    /// The cell at `coords`, or `None` outside the board.
    pub fn get(&self, coords: Coord2) -> Option<SolutionCell> {
        self.cells.get(coords.to_nd_index()).copied()
    }

    pub fn is_mine(&self, coords: Coord2) -> bool {
        self.get(coords).is_some_and(|cell| cell.is_mine)
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        neighbors(coords, self.size)
    }

    /// Text map of the grid: `*` for mines, `.` for zero, digits otherwise.
    pub fn render(&self) -> String {
        let (rows, cols) = self.size;
        let mut out = String::with_capacity(usize::from(rows) * (usize::from(cols) + 1));
        for row in 0..rows {
            if row > 0 {
                out.push('\n');
            }
            for col in 0..cols {
                let cell = self[(row, col)];
                out.push(match cell {
                    SolutionCell { is_mine: true, .. } => '*',
                    SolutionCell {
                        adjacent_mines: 0, ..
                    } => '.',
                    SolutionCell { adjacent_mines, .. } => {
                        char::from_digit(adjacent_mines.into(), 10).unwrap_or('?')
                    }
                });
            }
        }
        out
    }
}

impl Index<Coord2> for SolutionGrid {
    type Output = SolutionCell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}
