use std::collections::BTreeSet;

use chrono::prelude::*;
use tripwire_core::*;
use tripwire_protocol::{BoardView, CellRef, GameView, OpenedView};
use uuid::Uuid;

use crate::error::Result;
use crate::timer::Timer;

pub type GameId = Uuid;

/// Server-side record of one game.
///
/// Mines are placed on the first reveal; until then `mines` is `None`. The solution grid is a
/// cache derived from the mine list.
#[derive(Clone, Debug)]
pub struct GameSession {
    id: GameId,
    board: BoardConfig,
    mines: Option<Vec<Coord2>>,
    grid: Option<SolutionGrid>,
    pub(crate) lives: Lives,
    pub(crate) quick_flag: bool,
    pub(crate) history: History,
    pub(crate) status: Status,
    pub(crate) permanent_flags: BTreeSet<Coord2>,
    pub(crate) timer: Timer,
    last_snapshot: Option<Snapshot>,
}

impl GameSession {
    pub fn new(board: BoardConfig, lives: u8, quick_flag: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            board,
            mines: None,
            grid: None,
            lives: Lives::new(lives),
            quick_flag,
            history: History::new(),
            status: Status::New,
            permanent_flags: BTreeSet::new(),
            timer: Timer::new(),
            last_snapshot: None,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn board(&self) -> BoardConfig {
        self.board
    }

    pub fn has_mines(&self) -> bool {
        self.mines.is_some()
    }

    /// Fixes the mine layout. Only the first call has any effect.
    pub(crate) fn place_mines(&mut self, mines: Vec<Coord2>) {
        if self.mines.is_some() {
            log::warn!("Game {} already has mines placed", self.id);
            return;
        }
        log::debug!("Game {}: placed {} mines", self.id, mines.len());
        self.grid = Some(SolutionGrid::build(self.board.size(), &mines));
        self.mines = Some(mines);
    }

    fn ensure_grid(&mut self) {
        if self.grid.is_none()
            && let Some(mines) = &self.mines
        {
            self.grid = Some(SolutionGrid::build(self.board.size(), mines));
        }
    }

    pub(crate) fn solution(&mut self) -> Option<&SolutionGrid> {
        self.ensure_grid();
        self.grid.as_ref()
    }

    pub(crate) fn is_mine(&mut self, coords: Coord2) -> bool {
        self.solution().is_some_and(|grid| grid.is_mine(coords))
    }

    /// Latest reveal in the whole log that hit a mine.
    pub(crate) fn last_mine_reveal(&mut self) -> Option<(usize, Coord2)> {
        self.ensure_grid();
        let grid = self.grid.as_ref()?;
        self.history.last_mine_reveal(grid)
    }

    fn mine_list(&self) -> &[Coord2] {
        self.mines.as_deref().unwrap_or_default()
    }

    /// Board after replaying the first `upto` actions.
    pub(crate) fn snapshot_at(&mut self, upto: usize) -> Result<Snapshot> {
        self.ensure_grid();
        match &self.grid {
            Some(grid) => Ok(self.history.snapshot_at(grid, &self.permanent_flags, upto)?),
            None => Ok(Snapshot {
                flagged: self.permanent_flags.iter().copied().collect(),
                permanent_flags: self.permanent_flags.iter().copied().collect(),
                ..Snapshot::default()
            }),
        }
    }

    /// Snapshot at the cursor, cached for hints.
    pub(crate) fn current_snapshot(&mut self) -> Result<Snapshot> {
        match &self.last_snapshot {
            Some(snapshot) => Ok(snapshot.clone()),
            None => self.snapshot_at(self.history.cursor()),
        }
    }

    /// Replays up to the cursor and re-derives the status.
    ///
    /// Entering won or lost pauses the timer.
    pub(crate) fn refresh(&mut self, now: DateTime<Utc>) -> Result<Snapshot> {
        let snapshot = self.snapshot_at(self.history.cursor())?;
        let previous = self.status;
        self.status = derive_status(&snapshot, self.lives, self.history.cursor());
        if self.status != previous {
            log::debug!("Game {}: {:?} -> {:?}", self.id, previous, self.status);
        }
        if self.status.is_finished() && !previous.is_finished() {
            self.timer.pause(now);
        }
        self.last_snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Client view of `snapshot`. Mine positions are included only for a finished `status`.
    pub(crate) fn view(&self, snapshot: &Snapshot, status: Status, now: DateTime<Utc>) -> GameView {
        let mines = status
            .is_finished()
            .then(|| self.mine_list().iter().copied().map(CellRef::from).collect());
        GameView {
            game_id: self.id.to_string(),
            rows: self.board.rows,
            cols: self.board.cols,
            mines: self.board.mines,
            status,
            lives: self.lives,
            quick_flag: self.quick_flag,
            cursor: self.history.cursor(),
            total_actions: self.history.len(),
            elapsed_time: self.timer.elapsed_secs(now),
            board: BoardView {
                opened: snapshot.opened.iter().copied().map(OpenedView::from).collect(),
                flagged: snapshot.flagged.iter().copied().map(CellRef::from).collect(),
                permanent_flags: snapshot
                    .permanent_flags
                    .iter()
                    .copied()
                    .map(CellRef::from)
                    .collect(),
                lost_on: snapshot.lost_on.map(CellRef::from),
                cleared: snapshot.cleared,
                mines,
            },
            is_preview: false,
            preview_index: None,
        }
    }

    /// Refreshes and renders the current state.
    pub(crate) fn current_view(&mut self, now: DateTime<Utc>) -> Result<GameView> {
        let snapshot = self.refresh(now)?;
        Ok(self.view(&snapshot, self.status, now))
    }

    /// Renders the state after `index` actions without moving the cursor.
    pub(crate) fn preview(&mut self, index: usize, now: DateTime<Utc>) -> Result<GameView> {
        let index = self.history.clamp(index);
        let snapshot = self.snapshot_at(index)?;
        let status = derive_status(&snapshot, self.lives, index);
        Ok(GameView {
            is_preview: true,
            preview_index: Some(index),
            ..self.view(&snapshot, status, now)
        })
    }

    pub(crate) fn hint(&mut self) -> Result<Hint> {
        let snapshot = self.current_snapshot()?;
        Ok(select_hint(self.board.size(), &snapshot, self.mine_list()))
    }
}
