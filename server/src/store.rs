use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::prelude::*;
use tripwire_core::*;
use tripwire_protocol::{GameView, ModeResponse};

use crate::clock::Clock;
use crate::error::{Result, SessionError};
use crate::session::{GameId, GameSession};

pub type SessionHandle = Arc<Mutex<GameSession>>;

/// Storage for live game sessions.
///
/// Each session sits behind its own mutex, so operations on different games never wait on one
/// another.
pub trait SessionBackend: Send + Sync {
    fn init(&self) {}

    fn shutdown(&self) {}

    fn insert(&self, session: GameSession) -> SessionHandle;

    fn get(&self, id: &GameId) -> Option<SessionHandle>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    sessions: RwLock<HashMap<GameId, SessionHandle>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MemoryBackend {
    fn shutdown(&self) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        log::info!("Dropping {} sessions", sessions.len());
        sessions.clear();
    }

    fn insert(&self, session: GameSession) -> SessionHandle {
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::clone(&handle));
        handle
    }

    fn get(&self, id: &GameId) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub type BoxedPlacement = Box<dyn MinePlacement + Send>;

/// Game operations over a session backend.
pub struct SessionStore<B = MemoryBackend> {
    backend: B,
    placement: Mutex<BoxedPlacement>,
    clock: Arc<dyn Clock>,
}

impl SessionStore<MemoryBackend> {
    pub fn in_memory(placement: BoxedPlacement, clock: Arc<dyn Clock>) -> Self {
        Self::new(MemoryBackend::new(), placement, clock)
    }
}

impl<B: SessionBackend> SessionStore<B> {
    pub fn new(backend: B, placement: BoxedPlacement, clock: Arc<dyn Clock>) -> Self {
        backend.init();
        Self {
            backend,
            placement: Mutex::new(placement),
            clock,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn shutdown(&self) {
        self.backend.shutdown();
    }

    /// Runs `f` with the session locked for the whole call.
    fn with_session<R>(
        &self,
        id: &GameId,
        f: impl FnOnce(&mut GameSession, DateTime<Utc>) -> Result<R>,
    ) -> Result<R> {
        let handle = self.backend.get(id).ok_or(SessionError::NotFound)?;
        let mut session = handle.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *session, self.clock.now())
    }

    fn place(&self, board: BoardConfig, click: Coord2) -> Vec<Coord2> {
        let mut placement = self.placement.lock().unwrap_or_else(PoisonError::into_inner);
        placement.place(board, click)
    }

    pub fn create(&self, board: BoardConfig, lives: u8, quick_flag: bool) -> Result<GameView> {
        let board = BoardConfig::new(board.rows, board.cols, board.mines)?;
        let session = GameSession::new(board, lives, quick_flag);
        log::info!(
            "Created game {} ({}x{}, {} mines, lives {})",
            session.id(),
            board.rows,
            board.cols,
            board.mines,
            lives
        );
        let handle = self.backend.insert(session);
        let mut session = handle.lock().unwrap_or_else(PoisonError::into_inner);
        session.current_view(self.clock.now())
    }

    pub fn get(&self, id: &GameId) -> Result<GameView> {
        self.with_session(id, |session, now| session.current_view(now))
    }

    /// Opens a cell. The first reveal of a game places the mines around it.
    pub fn reveal(&self, id: &GameId, coords: Coord2) -> Result<GameView> {
        self.with_session(id, |session, now| {
            let coords = session.board().validate_coords(coords)?;
            if session.permanent_flags.contains(&coords) {
                log::debug!("Game {}: reveal on permanent flag {coords:?}", session.id());
                return session.current_view(now);
            }
            if session.status.is_finished() {
                return Err(SessionError::GameOver);
            }
            if session.history.cursor() == 0 && !session.has_mines() {
                let mines = self.place(session.board(), coords);
                session.place_mines(mines);
            }

            let already_open = session
                .snapshot_at(session.history.cursor())?
                .opened
                .iter()
                .any(|cell| cell.coords() == coords);
            let hit = !already_open && session.is_mine(coords);

            session.timer.start(now);
            session.timer.resume(now);
            session.history.record(Action::reveal(coords));
            if hit {
                session.lives.consume();
                session.timer.pause(now);
                log::info!(
                    "Game {}: mine hit at {coords:?}, lives left {}",
                    session.id(),
                    session.lives.left
                );
            }
            session.current_view(now)
        })
    }

    /// Sets, clears or toggles a flag.
    pub fn flag(&self, id: &GameId, coords: Coord2, set: Option<bool>) -> Result<GameView> {
        self.with_session(id, |session, now| {
            let coords = session.board().validate_coords(coords)?;
            if session.status.is_new() {
                return Err(SessionError::NotStarted);
            }
            if session.status.is_finished() {
                return Err(SessionError::GameOver);
            }
            if session.permanent_flags.contains(&coords) {
                return session.current_view(now);
            }
            session.timer.resume(now);
            session.history.record(Action::flag(coords, set));
            session.current_view(now)
        })
    }

    pub fn set_mode(&self, id: &GameId, quick_flag: bool) -> Result<ModeResponse> {
        self.with_session(id, |session, _| {
            session.quick_flag = quick_flag;
            Ok(ModeResponse {
                ok: true,
                quick_flag_enabled: quick_flag,
            })
        })
    }

    /// Moves the cursor back by `steps` (at least one).
    ///
    /// Landing on a state that still shows a mine hit steps back once more.
    pub fn undo(&self, id: &GameId, steps: usize) -> Result<GameView> {
        self.with_session(id, |session, now| {
            let cursor = session.history.cursor();
            if cursor > 0 {
                let mut target = cursor.saturating_sub(steps.max(1));
                if target > 0 && session.snapshot_at(target)?.lost_on.is_some() {
                    target -= 1;
                }
                log::debug!("Game {}: undo {cursor} -> {target}", session.id());
                session.history.seek(target);
            }
            session.current_view(now)
        })
    }

    pub fn seek(&self, id: &GameId, index: usize) -> Result<GameView> {
        self.with_session(id, |session, now| {
            session.history.seek(index);
            session.current_view(now)
        })
    }

    pub fn preview(&self, id: &GameId, index: usize) -> Result<GameView> {
        self.with_session(id, |session, now| session.preview(index, now))
    }

    /// Rewinds to just before the latest mine reveal and flags that mine for good.
    ///
    /// `to_index` trims further back, never past the mine reveal itself.
    pub fn revive(&self, id: &GameId, to_index: Option<usize>) -> Result<GameView> {
        self.with_session(id, |session, now| {
            if session.lives.is_exhausted() {
                return Err(SessionError::NoLivesLeft);
            }
            let (lost_index, mine) = session
                .last_mine_reveal()
                .ok_or(SessionError::NothingToRevive)?;
            let keep = to_index.map_or(lost_index, |index| index.min(lost_index));

            session.history.truncate(keep);
            session.history.seek(keep);
            session.permanent_flags.insert(mine);
            session.history.record(Action::flag(mine, Some(true)));
            session.timer.resume(now);
            log::info!(
                "Game {}: revived at {keep}, {mine:?} flagged permanently",
                session.id()
            );

            let snapshot = session.refresh(now)?;
            session.status = Status::Playing;
            Ok(session.view(&snapshot, Status::Playing, now))
        })
    }

    pub fn hint(&self, id: &GameId) -> Result<Hint> {
        self.with_session(id, |session, _| session.hint())
    }

    /// Pauses the timer, optionally at the elapsed seconds the client displayed.
    pub fn pause(&self, id: &GameId, elapsed: Option<u64>) -> Result<GameView> {
        self.with_session(id, |session, now| {
            match elapsed {
                Some(shown) => session.timer.pause_showing(now, shown),
                None => session.timer.pause(now),
            };
            session.current_view(now)
        })
    }

    pub fn resume(&self, id: &GameId) -> Result<GameView> {
        self.with_session(id, |session, now| {
            if !session.status.is_finished() {
                session.timer.resume(now);
            }
            session.current_view(now)
        })
    }
}
