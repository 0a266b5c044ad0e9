use serde::{Deserialize, Serialize};
use tripwire_core::BoardConfig;

use crate::*;

/// Game creation payload: either a named preset or explicit dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateRequest {
    #[serde(rename_all = "camelCase")]
    Preset {
        preset: Preset,
        #[serde(default)]
        lives: Option<u8>,
        #[serde(default)]
        quick_flag: Option<bool>,
    },
    #[serde(rename_all = "camelCase")]
    Custom {
        rows: Coord,
        cols: Coord,
        mines: CellCount,
        #[serde(default)]
        lives: Option<u8>,
        #[serde(default)]
        quick_flag: Option<bool>,
    },
}

impl CreateRequest {
    /// Requested board, not yet validated.
    pub fn board(&self) -> BoardConfig {
        match *self {
            Self::Preset { preset, .. } => preset.board(),
            Self::Custom {
                rows, cols, mines, ..
            } => BoardConfig::new_unchecked(rows, cols, mines),
        }
    }

    /// Requested lives, 0 (unlimited) when absent.
    pub fn lives(&self) -> u8 {
        match *self {
            Self::Preset { lives, .. } | Self::Custom { lives, .. } => lives.unwrap_or(0),
        }
    }

    pub fn quick_flag(&self) -> bool {
        match *self {
            Self::Preset { quick_flag, .. } | Self::Custom { quick_flag, .. } => {
                quick_flag.unwrap_or(false)
            }
        }
    }

    /// Label echoed back to the client.
    pub fn preset_label(&self) -> &'static str {
        match *self {
            Self::Preset { preset, .. } => preset.label(),
            Self::Custom { .. } => "Custom",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRequest {
    pub row: Coord,
    pub col: Coord,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRequest {
    pub row: Coord,
    pub col: Coord,
    /// `true` forces a flag, `false` clears it, absent toggles.
    #[serde(default)]
    pub set: Option<bool>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeRequest {
    pub quick_flag: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRequest {
    #[serde(default)]
    pub steps: Option<i64>,
}

/// Target history index for seek and preview; clamped by the service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRequest {
    pub to_index: i64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviveRequest {
    #[serde(default)]
    pub to_index: Option<i64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseRequest {
    /// Elapsed seconds last shown by the client.
    #[serde(default)]
    pub elapsed_seconds: Option<u64>,
}
