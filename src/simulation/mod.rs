//! # Simulation
//!
//! The automaton itself: the double-buffered cell store, the transition rule,
//! seed patterns and the engines that advance the store one generation at a
//! time. [`SimulationManager`] ties them to the frame loop.

pub mod cell_state;
pub mod cpu;
pub mod gpu;
pub mod manager;
pub mod patterns;
pub mod rule;
pub mod traits;

pub use cell_state::{CellStateStore, GridSize, PingPong};
pub use cpu::CpuStepEngine;
pub use gpu::GpuStepEngine;
pub use manager::{SimulationManager, StepOutcome};
pub use patterns::Pattern;
pub use rule::{LifeRule, Neighborhood};
pub use traits::StepEngine;
