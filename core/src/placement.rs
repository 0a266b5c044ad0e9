use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use rand::prelude::*;
use rand::rngs::SmallRng;

use crate::*;

/// Trial layouts tried per candidate pool before giving up on a small opening.
pub const DEFAULT_PLACEMENT_ATTEMPTS: usize = 12;

/// Upper bound on the first click's flood region, whatever the board size.
pub const MAX_ZERO_REGION: usize = 128;

/// Strategy choosing the secret mine layout once the first cell is clicked.
pub trait MinePlacement {
    fn place(&mut self, config: BoardConfig, click: Coord2) -> Vec<Coord2>;
}

/// Largest acceptable first-click opening: 10% of the board, between 1 and [`MAX_ZERO_REGION`].
pub fn max_zero_region(config: BoardConfig) -> usize {
    // round half up, integer only
    let tenth = (usize::from(config.total_cells()) + 5) / 10;
    tenth.clamp(1, MAX_ZERO_REGION)
}

/// Random placement that keeps the 3x3 block around the first click clear and prefers layouts
/// whose first opening stays within [`max_zero_region`].
///
/// Falls back in order to: any cell but the clicked one when the board is too crowded for the
/// 3x3 exclusion, then a plain random pick from the last pool once attempts run out.
#[derive(Clone, Debug)]
pub struct SafeStartPlacement<R> {
    rng: R,
    attempts: usize,
}

impl<R: Rng> SafeStartPlacement<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            attempts: DEFAULT_PLACEMENT_ATTEMPTS,
        }
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    fn try_small_opening(
        &mut self,
        pool: &mut [Coord2],
        config: BoardConfig,
        click: Coord2,
    ) -> Option<Vec<Coord2>> {
        let mines = usize::from(config.mines);
        let limit = max_zero_region(config);

        for attempt in 0..self.attempts {
            pool.shuffle(&mut self.rng);
            let trial = &pool[..mines];
            let grid = SolutionGrid::build(config.size(), trial);
            let mut opened = BTreeSet::new();
            match flood_open(&grid, click, &mut opened) {
                Ok(region) if region.len() <= limit => {
                    log::debug!(
                        "Placement accepted on attempt {}, first opening {} cells (limit {})",
                        attempt + 1,
                        region.len(),
                        limit
                    );
                    return Some(trial.to_vec());
                }
                Ok(region) => {
                    log::trace!(
                        "Placement attempt {} rejected, opening {} cells exceeds {}",
                        attempt + 1,
                        region.len(),
                        limit
                    );
                }
                Err(err) => {
                    log::error!("Placement trial flood failed: {}", err);
                    return None;
                }
            }
        }
        None
    }

    fn uniform(&mut self, pool: &mut [Coord2], mines: usize) -> Vec<Coord2> {
        pool.shuffle(&mut self.rng);
        pool[..mines].to_vec()
    }
}

impl SafeStartPlacement<SmallRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MinePlacement for SafeStartPlacement<R> {
    fn place(&mut self, config: BoardConfig, click: Coord2) -> Vec<Coord2> {
        let mines = usize::from(config.mines);
        if mines == 0 {
            return Vec::new();
        }

        let size = config.size();
        let forbidden = CellRect::around(click, size);
        let mut pool: Vec<Coord2> = iter_cells(size)
            .filter(|&coords| !forbidden.contains(coords))
            .collect();

        if pool.len() < mines {
            log::warn!(
                "Only {} cells outside the first click area for {} mines, keeping just the click safe",
                pool.len(),
                mines
            );
            pool = iter_cells(size).filter(|&coords| coords != click).collect();
        }

        if let Some(layout) = self.try_small_opening(&mut pool, config, click) {
            return layout;
        }

        log::warn!(
            "No layout with a small first opening after {} attempts, using a random one",
            self.attempts
        );
        self.uniform(&mut pool, mines)
    }
}

/// Always yields the same layout, ignoring the click.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedPlacement(pub Vec<Coord2>);

impl MinePlacement for FixedPlacement {
    fn place(&mut self, _config: BoardConfig, _click: Coord2) -> Vec<Coord2> {
        self.0.clone()
    }
}
