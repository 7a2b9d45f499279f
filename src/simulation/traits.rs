//! Core simulation traits
//!
//! Defines the seam between the frame loop and whatever executes the
//! per-cell transition.

use super::cell_state::CellStateStore;
use crate::error::Result;

/// Advances a [`CellStateStore`] by one generation.
///
/// Implementations own the write phase: they fill `next` from `current` and
/// then call [`CellStateStore::swap`] exactly once. On error the store's
/// `current` must be left untouched and no swap may happen.
pub trait StepEngine {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Make the engine's own state match `store.current()`.
    ///
    /// Called after seeding or reset. CPU engines have nothing to do.
    fn upload(&mut self, _store: &CellStateStore) -> Result<()> {
        Ok(())
    }

    /// Compute the next generation and swap it into `current`
    fn step(&mut self, store: &mut CellStateStore) -> Result<()>;

    /// Block until all submitted work has completed. Called before teardown.
    fn drain(&mut self) {}
}
