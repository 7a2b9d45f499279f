//! Lifegrid
//!
//! Conway-style cellular automaton stepped by a wgpu compute shader and drawn
//! as a grid of quads in a winit window.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod simulation;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::LifeApp;
pub use config::{LifeConfig, StepBackend};
pub use error::{LifeError, Result};

/// Opens a window and runs the automaton described by `config`
pub fn run(config: LifeConfig) -> anyhow::Result<()> {
    LifeApp::new(config).run()
}
