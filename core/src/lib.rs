#![cfg_attr(not(test), no_std)]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use error::*;
pub use flood::*;
pub use grid::*;
pub use hint::*;
pub use history::*;
pub use placement::*;
pub use state::*;
pub use types::*;

mod error;
mod flood;
mod grid;
mod hint;
mod history;
mod placement;
mod state;
mod types;

/// Immutable board shape of one game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub rows: Coord,
    pub cols: Coord,
    pub mines: CellCount,
}

impl BoardConfig {
    pub const fn new_unchecked(rows: Coord, cols: Coord, mines: CellCount) -> Self {
        Self { rows, cols, mines }
    }

    /// Accepts `rows > 0`, `cols > 0` and `mines < rows * cols`.
    pub fn new(rows: Coord, cols: Coord, mines: CellCount) -> Result<Self> {
        if rows == 0 || cols == 0 || mines >= mult(rows, cols) {
            return Err(GameError::InvalidBoard);
        }
        Ok(Self::new_unchecked(rows, cols, mines))
    }

    pub const fn size(&self) -> Coord2 {
        (self.rows, self.cols)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.cols)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if coords.0 < self.rows && coords.1 < self.cols {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }
}

/// Fixed difficulty levels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    Easy,
    Medium,
    Hard,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Easy, Preset::Medium, Preset::Hard];

    pub const fn board(self) -> BoardConfig {
        match self {
            Self::Easy => BoardConfig::new_unchecked(9, 9, 10),
            Self::Medium => BoardConfig::new_unchecked(16, 16, 40),
            // expert layout, wide
            Self::Hard => BoardConfig::new_unchecked(16, 30, 99),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}
