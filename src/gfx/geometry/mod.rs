//! # Grid Geometry
//!
//! CPU-side mesh generation for the two things the frame renderer draws:
//!
//! - **Grid lines**: built once per grid size ([`grid_lines`])
//! - **Live cells**: one quad per live cell, rebuilt from the current cell
//!   buffer after every generation ([`live_cells`])
//!
//! Both meshes use the same space: normalized device coordinates where the
//! whole grid spans `[-1, 1]` on both axes, with row 0 at the bottom. The
//! view transform applied by the shader handles aspect ratio.

pub mod grid_lines;
pub mod live_cells;

pub use grid_lines::GridLineMesh;
pub use live_cells::LiveCellMesh;

/// A 2D vertex in grid space.
///
/// `#[repr(C)]` keeps the layout identical to the `vec2<f32>` vertex input
/// of the grid shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2D {
    pub position: [f32; 2],
}

impl Vertex2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }

    /// Vertex buffer layout: position (Float32x2) at shader location 0
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex2D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

/// Maps a grid line number `i` of `cells` onto `[-1, 1]`.
///
/// Multiplying before dividing keeps `i == cells` exactly at 1.0, so cell
/// quads and grid lines land on identical coordinates.
pub fn to_ndc(i: u32, cells: u32) -> f32 {
    (i as f32 * 2.0) / cells as f32 - 1.0
}
