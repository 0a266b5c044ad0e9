use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No action recorded yet
    #[default]
    New,
    Playing,
    Lost,
    Won,
}

impl Status {
    pub const fn is_new(self) -> bool {
        matches!(self, Self::New)
    }

    /// Won or lost; no new moves are accepted
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Life budget of a game. A total of 0 means unlimited lives.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lives {
    pub total: u8,
    pub left: u8,
}

impl Lives {
    pub const fn new(total: u8) -> Self {
        Self { total, left: total }
    }

    pub const fn unlimited() -> Self {
        Self::new(0)
    }

    pub const fn is_unlimited(self) -> bool {
        self.total == 0
    }

    /// Finite lives with none left.
    pub const fn is_exhausted(self) -> bool {
        !self.is_unlimited() && self.left == 0
    }

    /// Takes one life; unlimited lives are never consumed. Returns whether one was taken.
    pub fn consume(&mut self) -> bool {
        if self.is_unlimited() {
            return false;
        }
        self.left = self.left.saturating_sub(1);
        true
    }
}

/// Status implied by a snapshot taken at `cursor`.
pub fn derive_status(snapshot: &Snapshot, lives: Lives, cursor: usize) -> Status {
    if snapshot.cleared {
        Status::Won
    } else if snapshot.lost_on.is_some() {
        if lives.is_exhausted() {
            Status::Lost
        } else {
            Status::Playing
        }
    } else if cursor == 0 {
        Status::New
    } else {
        Status::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lost_snapshot() -> Snapshot {
        Snapshot {
            lost_on: Some((0, 0)),
            ..Snapshot::default()
        }
    }

    #[test]
    fn unlimited_lives_never_run_out() {
        let mut lives = Lives::unlimited();
        assert!(!lives.consume());
        assert!(!lives.is_exhausted());
        assert_eq!(derive_status(&lost_snapshot(), lives, 3), Status::Playing);
    }

    #[test]
    fn last_life_loses() {
        let mut lives = Lives::new(2);
        assert!(lives.consume());
        assert_eq!(derive_status(&lost_snapshot(), lives, 1), Status::Playing);
        assert!(lives.consume());
        assert_eq!(derive_status(&lost_snapshot(), lives, 1), Status::Lost);
        assert!(lives.consume());
        assert_eq!(lives.left, 0);
    }

    #[test]
    fn cleared_wins_over_everything() {
        let snapshot = Snapshot {
            cleared: true,
            ..Snapshot::default()
        };
        assert_eq!(derive_status(&snapshot, Lives::new(1), 4), Status::Won);
        assert!(Status::Won.is_finished());
    }

    #[test]
    fn cursor_zero_is_new() {
        let snapshot = Snapshot::default();
        assert_eq!(derive_status(&snapshot, Lives::new(3), 0), Status::New);
        assert_eq!(derive_status(&snapshot, Lives::new(3), 2), Status::Playing);
    }

    #[test]
    fn status_wire_format() {
        assert_eq!(serde_json::to_string(&Status::Playing).unwrap(), r#""playing""#);
    }
}
