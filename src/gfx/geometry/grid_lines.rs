//! Static gridline geometry.

use super::{to_ndc, Vertex2D};
use crate::simulation::cell_state::GridSize;

/// Line-list vertices for `(W + 1)` vertical and `(H + 1)` horizontal lines
/// spanning the whole grid. Immutable once built; a new grid size needs a new
/// mesh.
#[derive(Debug, Clone)]
pub struct GridLineMesh {
    size: GridSize,
    vertices: Vec<Vertex2D>,
}

impl GridLineMesh {
    pub fn build(size: GridSize) -> Self {
        let mut vertices =
            Vec::with_capacity(2 * ((size.width as usize + 1) + (size.height as usize + 1)));

        for i in 0..=size.width {
            let x = to_ndc(i, size.width);
            vertices.push(Vertex2D::new(x, -1.0));
            vertices.push(Vertex2D::new(x, 1.0));
        }
        for j in 0..=size.height {
            let y = to_ndc(j, size.height);
            vertices.push(Vertex2D::new(-1.0, y));
            vertices.push(Vertex2D::new(1.0, y));
        }

        Self { size, vertices }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn vertices(&self) -> &[Vertex2D] {
        &self.vertices
    }

    /// Number of line endpoints, always `2 * ((W + 1) + (H + 1))`
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}
