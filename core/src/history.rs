use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// A recorded player move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Reveal {
        row: Coord,
        col: Coord,
    },
    /// `set`: `Some(true)` forces a flag, `Some(false)` clears it, `None` toggles.
    Flag {
        row: Coord,
        col: Coord,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        set: Option<bool>,
    },
}

impl Action {
    pub const fn reveal((row, col): Coord2) -> Self {
        Self::Reveal { row, col }
    }

    pub const fn flag((row, col): Coord2, set: Option<bool>) -> Self {
        Self::Flag { row, col, set }
    }

    pub const fn coords(&self) -> Coord2 {
        match *self {
            Self::Reveal { row, col } | Self::Flag { row, col, .. } => (row, col),
        }
    }
}

/// Board as seen after replaying a prefix of the history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// In the order the replay opened them.
    pub opened: Vec<OpenedCell>,
    /// Sorted; includes every permanent flag.
    pub flagged: Vec<Coord2>,
    pub permanent_flags: Vec<Coord2>,
    /// Mine hit by the most recent fatal reveal in the replayed prefix.
    pub lost_on: Option<Coord2>,
    pub cleared: bool,
}

/// Rebuilds the visible board from scratch by applying `actions` in order.
///
/// All reveals share one opened set, so a flood that overlaps an earlier one only reports the
/// cells it newly opened. A flag action on a permanently flagged cell always leaves it flagged.
///
/// The game is cleared only when every safe cell is open, no mine was hit, and the flags match
/// the mines exactly.
pub fn replay(
    grid: &SolutionGrid,
    actions: &[Action],
    permanent_flags: &BTreeSet<Coord2>,
) -> Result<Snapshot> {
    let mut opened = BTreeSet::new();
    let mut flagged = BTreeSet::new();
    let mut opened_list = Vec::new();
    let mut lost_on = None;

    for (index, action) in actions.iter().enumerate() {
        match *action {
            Action::Flag { row, col, set } => {
                let coords = (row, col);
                if permanent_flags.contains(&coords) {
                    flagged.insert(coords);
                    continue;
                }
                if set.unwrap_or(!flagged.contains(&coords)) {
                    flagged.insert(coords);
                } else {
                    flagged.remove(&coords);
                }
            }
            Action::Reveal { row, col } => {
                let coords = (row, col);
                if opened.contains(&coords) {
                    log::trace!("action[{}] reveal of {:?} skipped, already open", index, coords);
                    continue;
                }
                let Some(cell) = grid.get(coords) else {
                    log::error!("action[{}] reveals {:?}, outside the grid", index, coords);
                    return Err(GameError::CellOutOfGrid {
                        row: row.into(),
                        col: col.into(),
                    });
                };
                if cell.is_mine {
                    log::trace!("action[{}] hit the mine at {:?}", index, coords);
                    opened.insert(coords);
                    opened_list.push(OpenedCell::new(coords, 0));
                    lost_on = Some(coords);
                    continue;
                }
                opened_list.extend(flood_open(grid, coords, &mut opened)?);
            }
        }
    }

    flagged.extend(permanent_flags.iter().copied());

    let opened_safe = opened.iter().filter(|&&coords| !grid.is_mine(coords)).count();
    let flags_match_mines = flagged.len() == usize::from(grid.mine_count())
        && flagged.iter().all(|&coords| grid.is_mine(coords));
    let cleared = lost_on.is_none()
        && opened_safe == usize::from(grid.safe_cell_count())
        && flags_match_mines;

    log::debug!(
        "Replayed {} actions: {} opened, {} flagged, lost on {:?}, cleared {}",
        actions.len(),
        opened_list.len(),
        flagged.len(),
        lost_on,
        cleared
    );

    Ok(Snapshot {
        opened: opened_list,
        flagged: flagged.into_iter().collect(),
        permanent_flags: permanent_flags.iter().copied().collect(),
        lost_on,
        cleared,
    })
}

/// Append-only action log with a cursor marking how much of it is active.
///
/// Actions past the cursor stay available until a new action is recorded, which discards them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    actions: Vec<Action>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Clamps `index` into `[0, len]`.
    pub fn clamp(&self, index: usize) -> usize {
        index.min(self.actions.len())
    }

    /// Appends `action` at the cursor, dropping anything after it.
    pub fn record(&mut self, action: Action) {
        if self.cursor < self.actions.len() {
            log::debug!(
                "Recording at {} drops {} later actions",
                self.cursor,
                self.actions.len() - self.cursor
            );
        }
        self.actions.truncate(self.cursor);
        self.actions.push(action);
        self.cursor = self.actions.len();
    }

    /// Moves the cursor to `index`, clamped. Returns the new cursor.
    pub fn seek(&mut self, index: usize) -> usize {
        self.cursor = self.clamp(index);
        self.cursor
    }

    /// Discards every action from `len` on.
    pub fn truncate(&mut self, len: usize) {
        self.actions.truncate(len);
        self.cursor = self.cursor.min(self.actions.len());
    }

    /// Index and target of the latest reveal that hit a mine, over the whole log.
    pub fn last_mine_reveal(&self, grid: &SolutionGrid) -> Option<(usize, Coord2)> {
        self.actions
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, action)| match *action {
                Action::Reveal { row, col } if grid.is_mine((row, col)) => {
                    Some((index, (row, col)))
                }
                _ => None,
            })
    }

    /// Replays the first `upto` actions (clamped).
    pub fn snapshot_at(
        &self,
        grid: &SolutionGrid,
        permanent_flags: &BTreeSet<Coord2>,
        upto: usize,
    ) -> Result<Snapshot> {
        replay(grid, &self.actions[..self.clamp(upto)], permanent_flags)
    }
}
