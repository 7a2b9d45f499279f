//! Live-cell quad mesh derived from a cell buffer.

use super::{to_ndc, Vertex2D};
use crate::simulation::cell_state::GridSize;

/// Index pattern of one quad: two counter-clockwise triangles
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Quads for every live cell, in row-major scan order.
///
/// This is a derived view of a cell buffer: it is always rebuilt in full,
/// never patched.
#[derive(Debug, Clone, Default)]
pub struct LiveCellMesh {
    vertices: Vec<Vertex2D>,
    indices: Vec<u32>,
}

impl LiveCellMesh {
    pub fn build(cells: &[u32], size: GridSize) -> Self {
        let mut mesh = Self::default();
        mesh.rebuild(cells, size);
        mesh
    }

    /// Discards the previous contents and regenerates from `cells`,
    /// keeping the allocations.
    ///
    /// Each quad's indices are offset by the number of vertices emitted so
    /// far, so vertex blocks are packed with no gaps for dead cells.
    pub fn rebuild(&mut self, cells: &[u32], size: GridSize) {
        debug_assert_eq!(cells.len(), size.cell_count());
        self.vertices.clear();
        self.indices.clear();

        for y in 0..size.height {
            let bottom = to_ndc(y, size.height);
            let top = to_ndc(y + 1, size.height);
            for x in 0..size.width {
                if cells[(y * size.width + x) as usize] == 0 {
                    continue;
                }
                let left = to_ndc(x, size.width);
                let right = to_ndc(x + 1, size.width);

                let base = self.vertices.len() as u32;
                self.vertices.extend_from_slice(&[
                    Vertex2D::new(left, bottom),
                    Vertex2D::new(right, bottom),
                    Vertex2D::new(right, top),
                    Vertex2D::new(left, top),
                ]);
                self.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
            }
        }
    }

    pub fn vertices(&self) -> &[Vertex2D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn live_cell_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
