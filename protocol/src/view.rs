use serde::{Deserialize, Serialize};
use tripwire_core::{Coord2, Hint, OpenedCell};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub row: Coord,
    pub col: Coord,
}

impl From<Coord2> for CellRef {
    fn from((row, col): Coord2) -> Self {
        Self { row, col }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedView {
    pub row: Coord,
    pub col: Coord,
    pub adj: u8,
}

impl From<OpenedCell> for OpenedView {
    fn from(cell: OpenedCell) -> Self {
        Self {
            row: cell.row,
            col: cell.col,
            adj: cell.adjacent_mines,
        }
    }
}

/// Visible board layers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub opened: Vec<OpenedView>,
    pub flagged: Vec<CellRef>,
    pub permanent_flags: Vec<CellRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lost_on: Option<CellRef>,
    pub cleared: bool,
    /// Only present once the game is won or lost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mines: Option<Vec<CellRef>>,
}

/// Client-facing state of one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub game_id: String,
    pub rows: Coord,
    pub cols: Coord,
    pub mines: CellCount,
    pub status: Status,
    pub lives: Lives,
    pub quick_flag: bool,
    pub cursor: usize,
    pub total_actions: usize,
    /// Seconds of play, excluding paused time.
    pub elapsed_time: u64,
    pub board: BoardView,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_preview: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_index: Option<usize>,
}

impl GameView {
    /// Mine positions are present exactly when the shown state is won or lost.
    pub fn masks_mines(&self) -> bool {
        self.board.mines.is_some() == self.status.is_finished()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResponse {
    #[serde(flatten)]
    pub game: GameView,
    pub preset: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeResponse {
    pub ok: bool,
    pub quick_flag_enabled: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HintResponse {
    None,
    #[serde(rename_all = "camelCase")]
    MineArea { hint_rectangle: CellRect },
}

impl From<Hint> for HintResponse {
    fn from(hint: Hint) -> Self {
        match hint {
            Hint::None => Self::None,
            Hint::MineArea(hint_rectangle) => Self::MineArea { hint_rectangle },
        }
    }
}

/// Inclusive range of accepted values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd> Bounds<T> {
    pub fn contains(&self, value: &T) -> bool {
        &self.min <= value && value <= &self.max
    }
}

/// Creation limits enforced at the service boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub rows: Bounds<Coord>,
    pub cols: Bounds<Coord>,
    pub mines: Bounds<CellCount>,
    pub lives: Bounds<u8>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            rows: Bounds { min: 3, max: 30 },
            cols: Bounds { min: 3, max: 30 },
            mines: Bounds { min: 1, max: 900 },
            lives: Bounds { min: 0, max: 10 },
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: Preset,
    pub rows: Coord,
    pub cols: Coord,
    pub mines: CellCount,
}

impl From<Preset> for PresetInfo {
    fn from(name: Preset) -> Self {
        let board = name.board();
        Self {
            name,
            rows: board.rows,
            cols: board.cols,
            mines: board.mines,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub undo: bool,
    pub hints: bool,
    pub replay: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub presets: Vec<PresetInfo>,
    pub limits: Limits,
    pub features: Features,
}

impl CapabilitiesResponse {
    pub fn new(limits: Limits) -> Self {
        Self {
            presets: Preset::ALL.into_iter().map(PresetInfo::from).collect(),
            limits,
            features: Features {
                undo: true,
                hints: true,
                replay: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view(status: Status, mines: Option<Vec<CellRef>>) -> GameView {
        GameView {
            game_id: "g".into(),
            rows: 3,
            cols: 3,
            mines: 1,
            status,
            lives: Lives::new(0),
            quick_flag: false,
            cursor: 0,
            total_actions: 0,
            elapsed_time: 0,
            board: BoardView {
                mines,
                ..BoardView::default()
            },
            is_preview: false,
            preview_index: None,
        }
    }

    #[test]
    fn masking_rule() {
        let mines = Some(vec![CellRef { row: 0, col: 0 }]);
        assert!(view(Status::Playing, None).masks_mines());
        assert!(view(Status::Lost, mines.clone()).masks_mines());
        assert!(!view(Status::Playing, mines).masks_mines());
        assert!(!view(Status::Won, None).masks_mines());
    }

    #[test]
    fn running_view_has_no_mines_key() {
        let value = serde_json::to_value(view(Status::New, None)).unwrap();

        assert!(value["board"].get("mines").is_none());
        assert!(value.get("isPreview").is_none());
        assert_eq!(value["status"], json!("new"));
        assert_eq!(value["lives"], json!({ "total": 0, "left": 0 }));
    }

    #[test]
    fn hint_wire_format() {
        let none = serde_json::to_value(HintResponse::from(Hint::None)).unwrap();
        assert_eq!(none, json!({ "type": "none" }));

        let area = HintResponse::from(Hint::MineArea(CellRect::around((0, 0), (3, 3))));
        assert_eq!(
            serde_json::to_value(area).unwrap(),
            json!({
                "type": "mine-area",
                "hintRectangle": { "rowStart": 0, "colStart": 0, "rowEnd": 1, "colEnd": 1 }
            })
        );
    }

    #[test]
    fn create_response_flattens_view() {
        let response = CreateResponse {
            game: view(Status::New, None),
            preset: "Easy".into(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["gameId"], json!("g"));
        assert_eq!(value["preset"], json!("Easy"));
    }

    #[test]
    fn limits_defaults_fill_missing_fields() {
        let limits: Limits = serde_json::from_value(json!({ "lives": { "min": 0, "max": 3 } })).unwrap();
        assert_eq!(limits.rows, Limits::default().rows);
        assert_eq!(limits.lives.max, 3);
        assert!(limits.mines.contains(&900));
        assert!(!limits.rows.contains(&31));
    }

    #[test]
    fn capabilities_list_every_preset() {
        let caps = CapabilitiesResponse::new(Limits::default());
        assert_eq!(caps.presets.len(), 3);
        assert_eq!(caps.presets[2].cols, 30);
    }
}
