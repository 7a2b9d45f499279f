//! Classic seed patterns, expressed as sparse alive-coordinate sets.

use std::str::FromStr;

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::cell_state::GridSize;
use crate::error::LifeError;

/// Classic Game of Life patterns
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Pattern {
    Clear,
    Block,
    Blinker,
    Glider,
    GosperGun,
    Random { density: f64, seed: u64 },
}

const GLIDER: &[(u32, u32)] = &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];

const GOSPER_GUN: &[(u32, u32)] = &[
    (24, 0),
    (22, 1),
    (24, 1),
    (12, 2),
    (13, 2),
    (20, 2),
    (21, 2),
    (34, 2),
    (35, 2),
    (11, 3),
    (15, 3),
    (20, 3),
    (21, 3),
    (34, 3),
    (35, 3),
    (0, 4),
    (1, 4),
    (10, 4),
    (16, 4),
    (20, 4),
    (21, 4),
    (0, 5),
    (1, 5),
    (10, 5),
    (14, 5),
    (16, 5),
    (17, 5),
    (22, 5),
    (24, 5),
    (10, 6),
    (16, 6),
    (24, 6),
    (11, 7),
    (15, 7),
    (12, 8),
    (13, 8),
];

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Clear => "Clear",
            Pattern::Block => "Block",
            Pattern::Blinker => "Blinker",
            Pattern::Glider => "Glider",
            Pattern::GosperGun => "Gosper Gun",
            Pattern::Random { .. } => "Random",
        }
    }

    /// Alive coordinates of this pattern on a grid of `size`.
    ///
    /// Small patterns are centred; the gun is anchored near the left edge.
    /// Cells that would fall off the grid are dropped.
    pub fn cells(&self, size: GridSize) -> Vec<(u32, u32)> {
        let cx = size.width / 2;
        let cy = size.height / 2;

        let shape: &[(u32, u32)] = match self {
            Pattern::Clear => &[],
            Pattern::Block => &[(0, 0), (1, 0), (0, 1), (1, 1)],
            Pattern::Blinker => &[(1, 0), (1, 1), (1, 2)],
            Pattern::Glider => GLIDER,
            Pattern::GosperGun => GOSPER_GUN,
            Pattern::Random { density, seed } => {
                return random_cells(size, *density, *seed);
            }
        };

        let (ox, oy) = match self {
            Pattern::GosperGun => (
                (size.width.saturating_sub(36) / 2).min(10),
                cy.saturating_sub(5),
            ),
            _ => (cx.saturating_sub(1), cy.saturating_sub(1)),
        };

        shape
            .iter()
            .map(|&(dx, dy)| (ox + dx, oy + dy))
            .filter(|&(x, y)| x < size.width && y < size.height)
            .collect()
    }
}

fn random_cells(size: GridSize, density: f64, seed: u64) -> Vec<(u32, u32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let density = density.clamp(0.0, 1.0);
    let mut cells = Vec::new();
    for y in 0..size.height {
        for x in 0..size.width {
            if rng.random_bool(density) {
                cells.push((x, y));
            }
        }
    }
    cells
}

impl FromStr for Pattern {
    type Err = LifeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clear" => Ok(Pattern::Clear),
            "block" => Ok(Pattern::Block),
            "blinker" => Ok(Pattern::Blinker),
            "glider" => Ok(Pattern::Glider),
            "gosper" | "gosper-gun" | "gun" => Ok(Pattern::GosperGun),
            "random" => Ok(Pattern::Random {
                density: 0.3,
                seed: rand::rng().random(),
            }),
            other => Err(LifeError::Config(format!("unknown pattern '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(w: u32, h: u32) -> GridSize {
        GridSize::new(w, h).unwrap()
    }

    #[test]
    fn test_glider_is_centred() {
        let cells = Pattern::Glider.cells(size(16, 16));
        assert_eq!(cells.len(), 5);
        assert!(cells.contains(&(8, 7)));
        assert!(cells.contains(&(9, 9)));
    }

    #[test]
    fn test_gun_clips_to_small_grids() {
        assert_eq!(Pattern::GosperGun.cells(size(64, 32)).len(), 36);
        let clipped = Pattern::GosperGun.cells(size(20, 20));
        assert!(clipped.len() < 36);
        assert!(clipped.iter().all(|&(x, y)| x < 20 && y < 20));
    }

    #[test]
    fn test_gun_stays_on_narrow_grids() {
        let cells = Pattern::GosperGun.cells(size(10, 12));
        assert!(!cells.is_empty());
        assert!(cells.contains(&(0, 5)));
        assert!(cells.iter().all(|&(x, y)| x < 10 && y < 12));
    }

    #[test]
    fn test_random_is_reproducible() {
        let pattern = Pattern::Random {
            density: 0.4,
            seed: 7,
        };
        let a = pattern.cells(size(32, 32));
        let b = pattern.cells(size(32, 32));
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Glider".parse::<Pattern>().unwrap(), Pattern::Glider);
        assert_eq!("gun".parse::<Pattern>().unwrap(), Pattern::GosperGun);
        assert!(matches!(
            "random".parse::<Pattern>().unwrap(),
            Pattern::Random { .. }
        ));
        assert!("spaceship".parse::<Pattern>().is_err());
    }
}
