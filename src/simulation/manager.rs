//! Simulation manager for the frame loop
//!
//! Owns the cell store, the step engine and the derived live-cell mesh, and
//! sequences them once per frame: step, swap, mesh rebuild. Pacing, pause,
//! single-step and reset all live here so the app only forwards input.

use log::{debug, info, warn};

use super::{
    cell_state::{CellStateStore, GridSize},
    patterns::Pattern,
    traits::StepEngine,
};
use crate::{
    config::{LifeConfig, MAX_GENERATIONS_PER_SECOND},
    error::Result,
    gfx::geometry::LiveCellMesh,
};

/// Slowest pacing reachable by halving the rate
pub const MIN_GENERATIONS_PER_SECOND: f32 = 0.25;

/// Generations between progress log lines
const PROGRESS_INTERVAL: u64 = 50;

/// What a call to [`SimulationManager::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No step was due
    Idle,
    /// One generation was computed and the mesh rebuilt
    Advanced,
    /// A step was due but the engine failed; it will be retried
    Failed,
}

pub struct SimulationManager {
    store: CellStateStore,
    engine: Box<dyn StepEngine>,
    pattern: Pattern,

    mesh: LiveCellMesh,
    mesh_dirty: bool,

    generation: u64,
    running: bool,
    step_requested: bool,
    generations_per_second: f32,
    accumulated_time: f32,
    failed_steps: u64,
}

impl SimulationManager {
    /// Seeds a `width` x `height` grid with `pattern` and hands it to `engine`
    pub fn new(
        width: u32,
        height: u32,
        pattern: Pattern,
        mut engine: Box<dyn StepEngine>,
    ) -> Result<Self> {
        let size = GridSize::new(width, height)?;
        let store = CellStateStore::initialize(width, height, &pattern.cells(size))?;
        engine.upload(&store)?;

        let mesh = LiveCellMesh::build(store.current(), store.size());
        info!(
            "Seeded {}x{} grid with '{}' ({} live cells) on the {} engine",
            width,
            height,
            pattern.as_str(),
            store.live_count(),
            engine.name()
        );

        Ok(Self {
            store,
            engine,
            pattern,
            mesh,
            mesh_dirty: true,
            generation: 0,
            running: true,
            step_requested: false,
            generations_per_second: 10.0,
            accumulated_time: 0.0,
            failed_steps: 0,
        })
    }

    pub fn from_config(config: &LifeConfig, engine: Box<dyn StepEngine>) -> Result<Self> {
        let mut manager =
            Self::new(config.grid_width, config.grid_height, config.pattern, engine)?;
        manager.set_rate(config.generations_per_second);
        manager.running = !config.start_paused;
        Ok(manager)
    }

    /// Advances time by `delta_time` seconds and runs at most one step
    pub fn tick(&mut self, delta_time: f32) -> StepOutcome {
        let period = 1.0 / self.generations_per_second;

        let due = if self.running {
            self.accumulated_time += delta_time.max(0.0);
            self.accumulated_time >= period
        } else {
            self.step_requested
        };
        if !due {
            return StepOutcome::Idle;
        }

        match self.step_once() {
            Ok(()) => {
                self.step_requested = false;
                if self.running {
                    // Backlog is capped at one period
                    self.accumulated_time = (self.accumulated_time - period).min(period);
                }
                StepOutcome::Advanced
            }
            Err(e) => {
                self.failed_steps += 1;
                warn!(
                    "Step to generation {} failed ({} failures so far): {}",
                    self.generation + 1,
                    self.failed_steps,
                    e
                );
                StepOutcome::Failed
            }
        }
    }

    /// Computes one generation immediately, ignoring pacing and pause
    pub fn step_once(&mut self) -> Result<()> {
        self.engine.step(&mut self.store)?;
        self.generation += 1;
        self.mesh.rebuild(self.store.current(), self.store.size());
        self.mesh_dirty = true;

        if self.generation % PROGRESS_INTERVAL == 0 {
            info!(
                "Generation {}: {} live cells",
                self.generation,
                self.store.live_count()
            );
        }
        Ok(())
    }

    /// Restores the seed pattern and restarts the generation count
    pub fn reset(&mut self) -> Result<()> {
        let seed = self.pattern.cells(self.store.size());
        self.store.seed(&seed)?;
        self.engine.upload(&self.store)?;

        self.generation = 0;
        self.accumulated_time = 0.0;
        self.step_requested = false;
        self.mesh.rebuild(self.store.current(), self.store.size());
        self.mesh_dirty = true;

        info!(
            "Reset to '{}' ({} live cells)",
            self.pattern.as_str(),
            self.store.live_count()
        );
        Ok(())
    }

    pub fn set_pattern(&mut self, pattern: Pattern) -> Result<()> {
        self.pattern = pattern;
        self.reset()
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn toggle_running(&mut self) {
        self.set_running(!self.running);
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
        self.accumulated_time = 0.0;
        self.step_requested = false;
        info!(
            "Simulation {} at generation {}",
            if running { "resumed" } else { "paused" },
            self.generation
        );
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Queues one step for the next tick. Ignored while running.
    pub fn request_single_step(&mut self) {
        if !self.running {
            self.step_requested = true;
        }
    }

    pub fn set_rate(&mut self, generations_per_second: f32) {
        self.generations_per_second =
            generations_per_second.clamp(MIN_GENERATIONS_PER_SECOND, MAX_GENERATIONS_PER_SECOND);
        debug!("Rate set to {} generations/s", self.generations_per_second);
    }

    pub fn double_rate(&mut self) {
        self.set_rate(self.generations_per_second * 2.0);
    }

    pub fn halve_rate(&mut self) {
        self.set_rate(self.generations_per_second / 2.0);
    }

    pub fn rate(&self) -> f32 {
        self.generations_per_second
    }

    /// The rebuilt mesh, once per change
    pub fn take_mesh_update(&mut self) -> Option<&LiveCellMesh> {
        if self.mesh_dirty {
            self.mesh_dirty = false;
            Some(&self.mesh)
        } else {
            None
        }
    }

    pub fn mesh(&self) -> &LiveCellMesh {
        &self.mesh
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn failed_steps(&self) -> u64 {
        self.failed_steps
    }

    pub fn live_count(&self) -> usize {
        self.store.live_count()
    }

    pub fn store(&self) -> &CellStateStore {
        &self.store
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Waits for outstanding engine work before teardown
    pub fn drain(&mut self) {
        self.engine.drain();
        info!(
            "Stopped at generation {} with {} live cells",
            self.generation,
            self.store.live_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::LifeError,
        simulation::{
            cpu::CpuStepEngine,
            rule::{LifeRule, Neighborhood},
        },
    };

    fn cpu_engine() -> Box<dyn StepEngine> {
        Box::new(CpuStepEngine::new(LifeRule::CONWAY, Neighborhood::Moore))
    }

    /// Fails a fixed number of times, then behaves like the CPU engine
    struct FlakyEngine {
        failures_left: u32,
        inner: CpuStepEngine,
    }

    impl StepEngine for FlakyEngine {
        fn name(&self) -> &str {
            "flaky"
        }

        fn step(&mut self, store: &mut CellStateStore) -> Result<()> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(LifeError::DispatchFailure("injected".into()));
            }
            self.inner.step(store)
        }
    }

    #[test]
    fn test_new_seeds_and_publishes_mesh() {
        let mut manager = SimulationManager::new(16, 16, Pattern::Glider, cpu_engine()).unwrap();
        assert_eq!(manager.live_count(), 5);
        assert_eq!(manager.generation(), 0);

        let mesh = manager.take_mesh_update().unwrap();
        assert_eq!(mesh.live_cell_count(), 5);
        assert_eq!(mesh.index_count(), 30);
        assert!(manager.take_mesh_update().is_none());
    }

    #[test]
    fn test_invalid_grid_is_rejected() {
        let result = SimulationManager::new(0, 4, Pattern::Clear, cpu_engine());
        assert!(matches!(result, Err(LifeError::InvalidDimension { .. })));
    }

    #[test]
    fn test_tick_paces_steps() {
        let mut manager = SimulationManager::new(8, 8, Pattern::Blinker, cpu_engine()).unwrap();
        manager.set_rate(10.0);

        assert_eq!(manager.tick(0.06), StepOutcome::Idle);
        assert_eq!(manager.tick(0.06), StepOutcome::Advanced);
        assert_eq!(manager.generation(), 1);
        assert_eq!(manager.tick(0.01), StepOutcome::Idle);
    }

    #[test]
    fn test_at_most_one_step_per_tick() {
        let mut manager = SimulationManager::new(8, 8, Pattern::Blinker, cpu_engine()).unwrap();
        manager.set_rate(10.0);

        assert_eq!(manager.tick(5.0), StepOutcome::Advanced);
        assert_eq!(manager.generation(), 1);
        // The backlog is capped at one period
        assert_eq!(manager.tick(0.0), StepOutcome::Advanced);
        assert_eq!(manager.tick(0.0), StepOutcome::Idle);
    }

    #[test]
    fn test_blinker_returns_after_two_generations() {
        let mut manager = SimulationManager::new(7, 7, Pattern::Blinker, cpu_engine()).unwrap();
        let initial = manager.store().current().to_vec();

        manager.step_once().unwrap();
        assert_ne!(manager.store().current(), initial.as_slice());
        assert_eq!(manager.live_count(), 3);

        manager.step_once().unwrap();
        assert_eq!(manager.store().current(), initial.as_slice());
        assert_eq!(manager.generation(), 2);
    }

    #[test]
    fn test_mesh_tracks_each_generation() {
        let mut manager = SimulationManager::new(9, 9, Pattern::Blinker, cpu_engine()).unwrap();
        manager.take_mesh_update();

        manager.step_once().unwrap();
        let expected = LiveCellMesh::build(manager.store().current(), manager.store().size());
        let mesh = manager.take_mesh_update().unwrap();
        assert_eq!(mesh.vertices(), expected.vertices());
        assert_eq!(mesh.indices(), expected.indices());
    }

    #[test]
    fn test_paused_only_steps_on_request() {
        let config = LifeConfig::default()
            .with_grid_size(8, 8)
            .with_pattern(Pattern::Blinker)
            .with_start_paused(true);
        let mut manager = SimulationManager::from_config(&config, cpu_engine()).unwrap();
        assert!(!manager.is_running());

        assert_eq!(manager.tick(10.0), StepOutcome::Idle);
        manager.request_single_step();
        assert_eq!(manager.tick(0.0), StepOutcome::Advanced);
        assert_eq!(manager.tick(0.0), StepOutcome::Idle);
        assert_eq!(manager.generation(), 1);
    }

    #[test]
    fn test_single_step_ignored_while_running() {
        let mut manager = SimulationManager::new(8, 8, Pattern::Blinker, cpu_engine()).unwrap();
        manager.request_single_step();
        manager.set_running(false);
        assert_eq!(manager.tick(0.0), StepOutcome::Idle);
    }

    #[test]
    fn test_failed_step_keeps_state_and_retries() {
        let engine = Box::new(FlakyEngine {
            failures_left: 1,
            inner: CpuStepEngine::new(LifeRule::CONWAY, Neighborhood::Moore),
        });
        let mut manager = SimulationManager::new(8, 8, Pattern::Blinker, engine).unwrap();
        manager.set_rate(10.0);
        manager.take_mesh_update();
        let before = manager.store().current().to_vec();

        assert_eq!(manager.tick(0.2), StepOutcome::Failed);
        assert_eq!(manager.generation(), 0);
        assert_eq!(manager.failed_steps(), 1);
        assert_eq!(manager.store().current(), before.as_slice());
        assert!(manager.take_mesh_update().is_none());

        assert_eq!(manager.tick(0.0), StepOutcome::Advanced);
        assert_eq!(manager.generation(), 1);
        assert!(manager.take_mesh_update().is_some());
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut manager = SimulationManager::new(16, 16, Pattern::Glider, cpu_engine()).unwrap();
        let seed = manager.store().current().to_vec();
        for _ in 0..5 {
            manager.step_once().unwrap();
        }
        manager.take_mesh_update();

        manager.reset().unwrap();
        assert_eq!(manager.generation(), 0);
        assert_eq!(manager.store().current(), seed.as_slice());
        assert!(manager.take_mesh_update().is_some());
    }

    #[test]
    fn test_set_pattern_reseeds() {
        let mut manager = SimulationManager::new(16, 16, Pattern::Glider, cpu_engine()).unwrap();
        manager.set_pattern(Pattern::Block).unwrap();
        assert_eq!(manager.pattern(), Pattern::Block);
        assert_eq!(manager.live_count(), 4);

        manager.set_pattern(Pattern::Clear).unwrap();
        assert_eq!(manager.live_count(), 0);
        assert!(manager.take_mesh_update().unwrap().is_empty());
    }

    #[test]
    fn test_rate_is_clamped() {
        let mut manager = SimulationManager::new(4, 4, Pattern::Clear, cpu_engine()).unwrap();
        manager.set_rate(1.0);
        manager.halve_rate();
        manager.halve_rate();
        manager.halve_rate();
        assert_eq!(manager.rate(), MIN_GENERATIONS_PER_SECOND);

        manager.set_rate(MAX_GENERATIONS_PER_SECOND);
        manager.double_rate();
        assert_eq!(manager.rate(), MAX_GENERATIONS_PER_SECOND);
    }
}
