//! # Cell State Store
//!
//! Two equally sized cell buffers ("current" and "next") with O(1) role
//! exchange. The same [`PingPong`] pair backs both the CPU mirror here and the
//! GPU storage buffers in [`super::gpu`].
//!
//! Cells are stored as `u32` (0 = dead, 1 = alive) so the CPU layout matches
//! the `array<u32>` the compute kernel reads, and index `y * width + x`.

use crate::error::{LifeError, Result};

/// Width and height of the grid in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    /// Validates the dimensions. Both sides must be non-zero and the cell
    /// count must fit in a `u32` index.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let fits = (width as u64) * (height as u64) <= u32::MAX as u64;
        if width == 0 || height == 0 || !fits {
            return Err(LifeError::InvalidDimension { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Linear index of an in-range coordinate
    pub fn index(&self, x: u32, y: u32) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(LifeError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    /// Toroidal neighbor lookup: offsets wrap around both edges.
    pub fn wrapped_index(&self, x: u32, y: u32, dx: i32, dy: i32) -> usize {
        let w = self.width as i64;
        let h = self.height as i64;
        let nx = (x as i64 + dx as i64).rem_euclid(w);
        let ny = (y as i64 + dy as i64).rem_euclid(h);
        (ny * w + nx) as usize
    }
}

/// A pair of same-shaped slots with one designated as current.
///
/// `swap` only flips which slot is current; contents never move.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: usize,
}

impl<T> PingPong<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            slots: [first, second],
            current: 0,
        }
    }

    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    /// Which physical slot (0 or 1) currently plays the "current" role
    pub fn current_slot(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    pub fn next(&self) -> &T {
        &self.slots[self.current ^ 1]
    }

    pub fn next_mut(&mut self) -> &mut T {
        &mut self.slots[self.current ^ 1]
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[self.current]
    }

    /// Read access to current and write access to next at the same time
    pub fn split(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        if self.current == 0 {
            (&*a, b)
        } else {
            (&*b, a)
        }
    }
}

/// Host-side double-buffered cell grid
#[derive(Debug)]
pub struct CellStateStore {
    size: GridSize,
    buffers: PingPong<Vec<u32>>,
}

impl CellStateStore {
    /// Allocates both buffers zero-filled and marks every `seed` coordinate
    /// alive in `current`.
    pub fn initialize(width: u32, height: u32, seed: &[(u32, u32)]) -> Result<Self> {
        let size = GridSize::new(width, height)?;
        let cells = size.cell_count();
        let mut store = Self {
            size,
            buffers: PingPong::new(vec![0; cells], vec![0; cells]),
        };
        store.seed(seed)?;
        Ok(store)
    }

    /// Clears both buffers and applies a new seed to `current`.
    ///
    /// Validates every coordinate before touching the buffers, so an error
    /// leaves the store unchanged.
    pub fn seed(&mut self, seed: &[(u32, u32)]) -> Result<()> {
        let indices = seed
            .iter()
            .map(|&(x, y)| self.size.index(x, y))
            .collect::<Result<Vec<_>>>()?;

        self.buffers.current_mut().fill(0);
        self.buffers.next_mut().fill(0);
        let current = self.buffers.current_mut();
        for index in indices {
            current[index] = 1;
        }
        Ok(())
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn swap(&mut self) {
        self.buffers.swap();
    }

    /// Alive state of an in-range cell in `current`
    pub fn read(&self, x: u32, y: u32) -> Result<bool> {
        let index = self.size.index(x, y)?;
        Ok(self.buffers.current()[index] != 0)
    }

    pub fn current(&self) -> &[u32] {
        self.buffers.current()
    }

    pub fn next(&self) -> &[u32] {
        self.buffers.next()
    }

    /// `current` for reading and `next` for writing during a step
    pub fn split(&mut self) -> (&[u32], &mut [u32]) {
        let (current, next) = self.buffers.split();
        (current.as_slice(), next.as_mut_slice())
    }

    /// Copies a full generation (e.g. a GPU readback) into `next`.
    /// Values are normalised to 0/1.
    pub fn load_next(&mut self, cells: &[u32]) -> Result<()> {
        let expected = self.size.cell_count();
        if cells.len() != expected {
            return Err(LifeError::SizeMismatch {
                expected,
                actual: cells.len(),
            });
        }
        for (dst, &src) in self.buffers.next_mut().iter_mut().zip(cells) {
            *dst = (src != 0) as u32;
        }
        Ok(())
    }

    pub fn live_count(&self) -> usize {
        self.current().iter().filter(|&&cell| cell != 0).count()
    }

    /// Which physical buffer is current; exposed for swap bookkeeping checks
    pub fn current_slot(&self) -> usize {
        self.buffers.current_slot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert_eq!(
            CellStateStore::initialize(0, 4, &[]).unwrap_err(),
            LifeError::InvalidDimension {
                width: 0,
                height: 4
            }
        );
        assert!(CellStateStore::initialize(4, 0, &[]).is_err());
        assert!(GridSize::new(u32::MAX, 2).is_err());
    }

    #[test]
    fn test_both_buffers_share_length() {
        let store = CellStateStore::initialize(7, 3, &[(1, 1)]).unwrap();
        assert_eq!(store.current().len(), 21);
        assert_eq!(store.next().len(), 21);
        assert_eq!(store.live_count(), 1);
        assert!(store.next().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_read_reports_out_of_range() {
        let store = CellStateStore::initialize(5, 5, &[(2, 3)]).unwrap();
        assert!(store.read(2, 3).unwrap());
        assert!(!store.read(3, 2).unwrap());
        assert!(matches!(
            store.read(5, 0),
            Err(LifeError::OutOfRange { x: 5, y: 0, .. })
        ));
        assert!(store.read(0, 5).is_err());
    }

    #[test]
    fn test_bad_seed_leaves_store_untouched() {
        let mut store = CellStateStore::initialize(3, 3, &[(0, 0)]).unwrap();
        assert!(store.seed(&[(1, 1), (3, 1)]).is_err());
        assert!(store.read(0, 0).unwrap());
        assert!(!store.read(1, 1).unwrap());
    }

    #[test]
    fn test_swap_twice_restores_roles() {
        let mut store = CellStateStore::initialize(4, 4, &[(1, 2)]).unwrap();
        let slot = store.current_slot();
        let before = store.current().to_vec();

        store.swap();
        assert_ne!(store.current_slot(), slot);
        assert!(store.current().iter().all(|&c| c == 0));

        store.swap();
        assert_eq!(store.current_slot(), slot);
        assert_eq!(store.current(), before.as_slice());
    }

    #[test]
    fn test_load_next_checks_length_and_normalises() {
        let mut store = CellStateStore::initialize(2, 2, &[]).unwrap();
        assert_eq!(
            store.load_next(&[1, 0, 1]).unwrap_err(),
            LifeError::SizeMismatch {
                expected: 4,
                actual: 3
            }
        );
        store.load_next(&[5, 0, 0, 1]).unwrap();
        store.swap();
        assert_eq!(store.current(), &[1, 0, 0, 1]);
    }

    #[test]
    fn test_wrapped_index_crosses_edges() {
        let size = GridSize::new(4, 3).unwrap();
        assert_eq!(size.wrapped_index(0, 0, -1, -1), size.index(3, 2).unwrap());
        assert_eq!(size.wrapped_index(3, 2, 1, 1), 0);
        assert_eq!(size.wrapped_index(1, 1, 0, 0), 5);
    }
}
