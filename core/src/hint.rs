use alloc::collections::BTreeSet;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hint {
    /// Every mine is already open
    None,
    /// A hidden mine lies inside this area
    MineArea(CellRect),
}

/// Picks the hidden mine most worth warning about and returns the 3x3 area around it.
///
/// Unflagged hidden mines are ranked by how many open cells border them; ties go to the
/// later position in row-major order. With every hidden mine flagged, the first one in `mines`
/// order is used.
pub fn select_hint(size: Coord2, snapshot: &Snapshot, mines: &[Coord2]) -> Hint {
    let opened: BTreeSet<Coord2> = snapshot.opened.iter().map(OpenedCell::coords).collect();
    let flagged: BTreeSet<Coord2> = snapshot.flagged.iter().copied().collect();

    let mut hidden = mines.iter().copied().filter(|coords| !opened.contains(coords));
    let Some(first_hidden) = hidden.next() else {
        return Hint::None;
    };

    let mut best: Option<(u32, Coord2)> = None;
    for mine in core::iter::once(first_hidden).chain(hidden) {
        if flagged.contains(&mine) {
            continue;
        }
        let score = usefulness(mine, size, &opened);
        if best.is_none_or(|(best_score, _)| score > best_score) {
            best = Some((score, mine));
        }
    }

    let chosen = best.map_or(first_hidden, |(_, mine)| mine);
    log::debug!("Hint points at the mine near {:?}", chosen);
    Hint::MineArea(CellRect::around(chosen, size))
}

fn usefulness(mine: Coord2, size: Coord2, opened: &BTreeSet<Coord2>) -> u32 {
    let open_neighbors = neighbors(mine, size)
        .filter(|pos| opened.contains(pos))
        .count() as u32;
    // position term only breaks ties
    open_neighbors * 10_000 + u32::from(mine.0) * 100 + u32::from(mine.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_of(grid: &SolutionGrid, actions: &[Action]) -> Snapshot {
        replay(grid, actions, &BTreeSet::new()).unwrap()
    }

    #[test]
    fn no_hidden_mines_means_no_hint() {
        let grid = SolutionGrid::build((2, 2), &[(0, 0)]);
        let snapshot = snapshot_of(&grid, &[Action::reveal((0, 0))]);

        assert_eq!(select_hint((2, 2), &snapshot, &[(0, 0)]), Hint::None);
    }

    #[test]
    fn prefers_mine_with_most_open_neighbors() {
        let mines = [(0, 0), (4, 4)];
        let grid = SolutionGrid::build((5, 5), &mines);
        // opens (1,1) only, next to (0,0)
        let snapshot = snapshot_of(&grid, &[Action::reveal((1, 1))]);

        let hint = select_hint((5, 5), &snapshot, &mines);

        assert_eq!(
            hint,
            Hint::MineArea(CellRect {
                row_start: 0,
                col_start: 0,
                row_end: 1,
                col_end: 1,
            })
        );
    }

    #[test]
    fn ties_go_to_later_position() {
        let mines = [(0, 0), (4, 4)];
        let grid = SolutionGrid::build((5, 5), &mines);
        let snapshot = snapshot_of(&grid, &[]);

        let hint = select_hint((5, 5), &snapshot, &mines);

        assert_eq!(hint, Hint::MineArea(CellRect::around((4, 4), (5, 5))));
    }

    #[test]
    fn skips_flagged_mines() {
        let mines = [(0, 0), (4, 4)];
        let grid = SolutionGrid::build((5, 5), &mines);
        let snapshot = snapshot_of(&grid, &[Action::reveal((1, 1)), Action::flag((0, 0), None)]);

        let hint = select_hint((5, 5), &snapshot, &mines);

        assert_eq!(hint, Hint::MineArea(CellRect::around((4, 4), (5, 5))));
    }

    #[test]
    fn all_flagged_falls_back_to_first_hidden() {
        let mines = [(4, 4), (0, 0)];
        let grid = SolutionGrid::build((5, 5), &mines);
        let snapshot = snapshot_of(
            &grid,
            &[Action::flag((0, 0), None), Action::flag((4, 4), None)],
        );

        let hint = select_hint((5, 5), &snapshot, &mines);

        assert_eq!(hint, Hint::MineArea(CellRect::around((4, 4), (5, 5))));
    }
}
