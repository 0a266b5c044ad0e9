use thiserror::Error;
use tripwire_core::GameError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Game not found")]
    NotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Game has not started. Reveal a cell first.")]
    NotStarted,
    #[error("Game is over")]
    GameOver,
    #[error("No lives left")]
    NoLivesLeft,
    #[error("No mine reveal to revive from")]
    NothingToRevive,
    #[error("Mine positions would leak into a running game")]
    MineLeak,
    #[error("Failed to encode response: {0}")]
    Encode(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(GameError),
}

impl SessionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// HTTP-style status code reported to clients.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidInput(_) => 400,
            Self::NotStarted | Self::NothingToRevive => 422,
            Self::GameOver | Self::NoLivesLeft => 409,
            Self::MineLeak | Self::Encode(_) | Self::Invariant(_) => 500,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::NotStarted => "not_started",
            Self::GameOver => "game_over",
            Self::NoLivesLeft => "no_lives_left",
            Self::NothingToRevive => "nothing_to_revive",
            Self::MineLeak | Self::Encode(_) | Self::Invariant(_) => "internal",
        }
    }
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        if err.is_invariant_violation() {
            Self::Invariant(err)
        } else {
            Self::InvalidInput(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
