//! CPU step engine
//!
//! Host-side implementation of the same per-cell function the compute kernel
//! evaluates. Used as the reference in tests and as a fallback backend when
//! no GPU is wanted.

use super::{
    cell_state::{CellStateStore, GridSize},
    rule::{LifeRule, Neighborhood},
    traits::StepEngine,
};
use crate::error::Result;

/// Single-threaded life-like step
pub struct CpuStepEngine {
    rule: LifeRule,
    neighborhood: Neighborhood,
    step_count: u64,
}

impl CpuStepEngine {
    pub fn new(rule: LifeRule, neighborhood: Neighborhood) -> Self {
        Self {
            rule,
            neighborhood,
            step_count: 0,
        }
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }
}

/// Live neighbors of `(x, y)` with toroidal wraparound
pub fn neighbor_count(
    cells: &[u32],
    size: GridSize,
    neighborhood: Neighborhood,
    x: u32,
    y: u32,
) -> u32 {
    neighborhood
        .offsets()
        .iter()
        .map(|&(dx, dy)| (cells[size.wrapped_index(x, y, dx, dy)] != 0) as u32)
        .sum()
}

impl StepEngine for CpuStepEngine {
    fn name(&self) -> &str {
        "cpu"
    }

    fn step(&mut self, store: &mut CellStateStore) -> Result<()> {
        let size = store.size();
        let (current, next) = store.split();

        for y in 0..size.height {
            for x in 0..size.width {
                let index = (y * size.width + x) as usize;
                let count = neighbor_count(current, size, self.neighborhood, x, y);
                next[index] = self.rule.apply(current[index] != 0, count) as u32;
            }
        }

        store.swap();
        self.step_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conway() -> CpuStepEngine {
        CpuStepEngine::new(LifeRule::CONWAY, Neighborhood::Moore)
    }

    fn alive(store: &CellStateStore) -> Vec<(u32, u32)> {
        let size = store.size();
        (0..size.height)
            .flat_map(|y| (0..size.width).map(move |x| (x, y)))
            .filter(|&(x, y)| store.read(x, y).unwrap())
            .collect()
    }

    #[test]
    fn test_isolated_cell_dies() {
        let mut store = CellStateStore::initialize(3, 3, &[(1, 1)]).unwrap();
        conway().step(&mut store).unwrap();
        assert!(store.current().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_single_cell_on_5x5_leaves_grid_empty() {
        let mut store = CellStateStore::initialize(5, 5, &[(2, 2)]).unwrap();
        conway().step(&mut store).unwrap();
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_block_is_still_life() {
        let block = [(2, 2), (3, 2), (2, 3), (3, 3)];
        let mut store = CellStateStore::initialize(6, 6, &block).unwrap();
        let before = store.current().to_vec();
        for &(x, y) in &block {
            assert_eq!(
                neighbor_count(store.current(), store.size(), Neighborhood::Moore, x, y),
                3
            );
        }

        conway().step(&mut store).unwrap();
        assert_eq!(store.current(), before.as_slice());
    }

    #[test]
    fn test_blinker_oscillates() {
        let vertical = [(2, 1), (2, 2), (2, 3)];
        let mut store = CellStateStore::initialize(5, 5, &vertical).unwrap();
        let mut engine = conway();

        engine.step(&mut store).unwrap();
        assert_eq!(alive(&store), vec![(1, 2), (2, 2), (3, 2)]);

        engine.step(&mut store).unwrap();
        assert_eq!(alive(&store), vec![(2, 1), (2, 2), (2, 3)]);
        assert_eq!(engine.step_count(), 2);
    }

    #[test]
    fn test_neighbor_counting_wraps_at_corner() {
        let mut store = CellStateStore::initialize(4, 4, &[(0, 0)]).unwrap();
        let size = store.size();
        let cells = store.current();

        for (x, y) in [(3, 3), (1, 1), (3, 0), (0, 3), (1, 3), (3, 1)] {
            assert_eq!(
                neighbor_count(cells, size, Neighborhood::Moore, x, y),
                1,
                "({x}, {y}) should see the corner cell"
            );
        }
        assert_eq!(neighbor_count(cells, size, Neighborhood::Moore, 2, 2), 0);

        // Corner block split across all four corners is still a block on a torus
        store.seed(&[(0, 0), (3, 0), (0, 3), (3, 3)]).unwrap();
        let before = store.current().to_vec();
        conway().step(&mut store).unwrap();
        assert_eq!(store.current(), before.as_slice());
    }

    #[test]
    fn test_von_neumann_counts_orthogonal_only() {
        let store = CellStateStore::initialize(5, 5, &[(1, 1), (2, 1), (3, 3)]).unwrap();
        let cells = store.current();
        assert_eq!(
            neighbor_count(cells, store.size(), Neighborhood::VonNeumann, 2, 2),
            1
        );
        assert_eq!(
            neighbor_count(cells, store.size(), Neighborhood::Moore, 2, 2),
            3
        );
    }

    #[test]
    fn test_runs_are_deterministic() {
        let seed = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2), (6, 6), (7, 6), (8, 6)];
        let run = || {
            let mut store = CellStateStore::initialize(12, 10, &seed).unwrap();
            let mut engine = conway();
            let mut snapshots = Vec::new();
            for _ in 0..20 {
                engine.step(&mut store).unwrap();
                snapshots.push(store.current().to_vec());
            }
            snapshots
        };
        assert_eq!(run(), run());
    }
}
