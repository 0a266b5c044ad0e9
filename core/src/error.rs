use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board needs at least one row and column and fewer mines than cells")]
    InvalidBoard,
    #[error("Grid must have at least one row")]
    EmptyGrid,
    #[error("Cell ({row}, {col}) is outside the grid")]
    CellOutOfGrid { row: usize, col: usize },
}

impl GameError {
    /// Broken grid invariants, as opposed to rejected input.
    pub const fn is_invariant_violation(self) -> bool {
        matches!(self, Self::EmptyGrid | Self::CellOutOfGrid { .. })
    }
}

pub type Result<T> = core::result::Result<T, GameError>;
