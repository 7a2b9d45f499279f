// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Provides typed buffer wrappers and binding-type shorthands used by the
//! step engine and the frame renderer.

pub mod binding_types;
pub mod uniform_buffer;

// Re-export main types
pub use binding_types::*;
pub use uniform_buffer::{ArrayBuffer, UniformBuffer};
