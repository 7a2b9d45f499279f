//! Aspect-preserving view transform for the grid.

use cgmath::{Matrix4, SquareMatrix};

/// Fraction of the shorter window side the grid occupies
const MARGIN: f32 = 0.95;

/// Per-draw parameters of the grid shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub transform: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl DrawUniform {
    pub fn new(transform: Matrix4<f32>, color: [f32; 4]) -> Self {
        Self {
            transform: transform.into(),
            color,
        }
    }
}

/// Scales grid space so cells stay square inside a `window_width` x
/// `window_height` surface, letterboxing the spare axis.
pub fn grid_transform(
    grid_width: u32,
    grid_height: u32,
    window_width: u32,
    window_height: u32,
) -> Matrix4<f32> {
    if window_width == 0 || window_height == 0 {
        return Matrix4::identity();
    }

    let window_aspect = window_width as f32 / window_height as f32;
    let grid_aspect = grid_width as f32 / grid_height as f32;

    let (sx, sy) = if window_aspect > grid_aspect {
        (grid_aspect / window_aspect, 1.0)
    } else {
        (1.0, window_aspect / grid_aspect)
    };

    Matrix4::from_nonuniform_scale(sx * MARGIN, sy * MARGIN, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    fn project(m: Matrix4<f32>, x: f32, y: f32) -> (f32, f32) {
        let p = m * Vector4::new(x, y, 0.0, 1.0);
        (p.x, p.y)
    }

    #[test]
    fn test_square_grid_in_square_window() {
        let m = grid_transform(64, 64, 800, 800);
        let (x, y) = project(m, 1.0, 1.0);
        assert!((x - MARGIN).abs() < 1e-6);
        assert!((y - MARGIN).abs() < 1e-6);
    }

    #[test]
    fn test_cells_stay_square_in_wide_window() {
        let (w, h) = (1200u32, 600u32);
        let m = grid_transform(10, 10, w, h);
        let (x, y) = project(m, 1.0, 1.0);
        // Pixel extents of the grid must match on both axes
        let px = x * w as f32 / 2.0;
        let py = y * h as f32 / 2.0;
        assert!((px - py).abs() < 1e-3);
        assert!(y <= 1.0 && x < y);
    }

    #[test]
    fn test_zero_sized_window_falls_back_to_identity() {
        assert_eq!(grid_transform(8, 8, 0, 600), Matrix4::identity());
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<DrawUniform>(), 80);
    }
}
