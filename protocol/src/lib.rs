//! Wire types exchanged with game clients.
//!
//! Field names are camelCase on the wire. A [`GameView`] never carries mine positions while the
//! game is still running; [`GameView::masks_mines`] checks that before anything is serialized.

use serde::{Deserialize, Serialize};

pub use request::*;
pub use view::*;

pub use tripwire_core::{CellCount, CellRect, Coord, Lives, Preset, Status};

mod request;
mod view;

/// One call into the game service, tagged by `op`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    Create {
        #[serde(default)]
        idempotency_key: Option<String>,
        body: CreateRequest,
    },
    Get {
        game_id: String,
    },
    Reveal {
        game_id: String,
        body: CellRequest,
    },
    Flag {
        game_id: String,
        body: FlagRequest,
    },
    Mode {
        game_id: String,
        body: ModeRequest,
    },
    Undo {
        game_id: String,
        #[serde(default)]
        body: UndoRequest,
    },
    Seek {
        game_id: String,
        body: IndexRequest,
    },
    Preview {
        game_id: String,
        body: IndexRequest,
    },
    Revive {
        game_id: String,
        #[serde(default)]
        body: ReviveRequest,
    },
    Hint {
        game_id: String,
    },
    Pause {
        game_id: String,
        #[serde(default)]
        body: PauseRequest,
    },
    Resume {
        game_id: String,
    },
    Capabilities,
}

impl Request {
    pub fn op(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Get { .. } => "get",
            Self::Reveal { .. } => "reveal",
            Self::Flag { .. } => "flag",
            Self::Mode { .. } => "mode",
            Self::Undo { .. } => "undo",
            Self::Seek { .. } => "seek",
            Self::Preview { .. } => "preview",
            Self::Revive { .. } => "revive",
            Self::Hint { .. } => "hint",
            Self::Pause { .. } => "pause",
            Self::Resume { .. } => "resume",
            Self::Capabilities => "capabilities",
        }
    }
}

/// Status code, optional location and JSON body of a handled request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub body: serde_json::Value,
}

/// Body of every failed call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}
