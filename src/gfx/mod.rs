//! # Graphics Module
//!
//! Everything that touches wgpu for drawing:
//!
//! - **Context** ([`context`]) - instance, surface, adapter, device and queue
//! - **Shaders** ([`shader`]) - WGSL compile and pipeline link with validation
//! - **Geometry** ([`geometry`]) - grid-line and live-cell meshes
//! - **Renderer** ([`renderer`]) - one frame: clear, grid lines, cells
//! - **View** ([`view`]) - aspect-preserving transform uniform

pub mod context;
pub mod geometry;
pub mod renderer;
pub mod shader;
pub mod view;

pub use context::{GpuDevice, GraphicsContext};
pub use renderer::{FrameRenderer, Palette};
pub use shader::Shader;
