//! Game session service: owns every live game, applies moves through replay and answers
//! requests with masked views.

pub mod clock;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod service;
pub mod session;
pub mod store;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ServerConfig;
pub use error::SessionError;
pub use idempotency::{IdempotencyCache, StoredResponse};
pub use service::GameService;
pub use session::{GameId, GameSession};
pub use store::{MemoryBackend, SessionBackend, SessionStore};
