//! # Life-like Rules
//!
//! A rule is a pair of neighbor-count sets: counts that bring a dead cell to
//! life and counts that keep a live cell alive. Both are stored as bit masks
//! (bit `n` set means "n neighbors") so the compute kernel can evaluate the
//! rule with a single shift.

use std::fmt;
use std::str::FromStr;

use crate::error::LifeError;

/// Which surrounding cells count as neighbors. Both wrap toroidally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Neighborhood {
    /// The 8 surrounding cells
    #[default]
    Moore,
    /// The 4 orthogonally adjacent cells
    VonNeumann,
}

impl Neighborhood {
    /// Offsets `(dx, dy)` of every neighbor
    pub fn offsets(&self) -> &'static [(i32, i32)] {
        match self {
            Neighborhood::Moore => &[
                (-1, -1),
                (0, -1),
                (1, -1),
                (-1, 0),
                (1, 0),
                (-1, 1),
                (0, 1),
                (1, 1),
            ],
            Neighborhood::VonNeumann => &[(0, -1), (-1, 0), (1, 0), (0, 1)],
        }
    }

    /// Value written into the kernel's parameter block
    pub fn shader_id(&self) -> u32 {
        match self {
            Neighborhood::Moore => 0,
            Neighborhood::VonNeumann => 1,
        }
    }
}

impl FromStr for Neighborhood {
    type Err = LifeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "moore" => Ok(Neighborhood::Moore),
            "vonneumann" | "von-neumann" | "von_neumann" => Ok(Neighborhood::VonNeumann),
            other => Err(LifeError::Config(format!("unknown neighborhood '{other}'"))),
        }
    }
}

/// Birth/survival rule in B/S notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifeRule {
    pub birth: u32,
    pub survive: u32,
}

impl LifeRule {
    /// Conway's Game of Life, B3/S23
    pub const CONWAY: LifeRule = LifeRule {
        birth: 1 << 3,
        survive: (1 << 2) | (1 << 3),
    };

    pub fn new(birth: &[u8], survive: &[u8]) -> Result<Self, LifeError> {
        Ok(Self {
            birth: Self::mask(birth)?,
            survive: Self::mask(survive)?,
        })
    }

    fn mask(counts: &[u8]) -> Result<u32, LifeError> {
        counts.iter().try_fold(0u32, |mask, &n| {
            if n > 8 {
                Err(LifeError::Config(format!("neighbor count {n} exceeds 8")))
            } else {
                Ok(mask | (1 << n))
            }
        })
    }

    /// Next state of one cell given its state and live-neighbor count
    pub fn apply(&self, alive: bool, neighbors: u32) -> bool {
        let mask = if alive { self.survive } else { self.birth };
        neighbors <= 8 && (mask >> neighbors) & 1 == 1
    }
}

impl Default for LifeRule {
    fn default() -> Self {
        Self::CONWAY
    }
}

impl fmt::Display for LifeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = |mask: u32| -> String {
            (0..=8)
                .filter(|n| (mask >> n) & 1 == 1)
                .map(|n| char::from(b'0' + n as u8))
                .collect()
        };
        write!(f, "B{}/S{}", digits(self.birth), digits(self.survive))
    }
}

impl FromStr for LifeRule {
    type Err = LifeError;

    /// Parses `B3/S23` style notation (case-insensitive, either order).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || LifeError::Config(format!("malformed rule '{s}', expected e.g. B3/S23"));

        let mut birth = None;
        let mut survive = None;
        for part in s.trim().split('/') {
            let mut chars = part.chars();
            let slot = match chars.next().map(|c| c.to_ascii_uppercase()) {
                Some('B') => &mut birth,
                Some('S') => &mut survive,
                _ => return Err(bad()),
            };
            if slot.is_some() {
                return Err(bad());
            }
            let counts = chars
                .map(|c| c.to_digit(10).map(|d| d as u8).ok_or_else(bad))
                .collect::<Result<Vec<u8>, _>>()?;
            *slot = Some(counts);
        }

        match (birth, survive) {
            (Some(b), Some(s)) => LifeRule::new(&b, &s),
            _ => Err(bad()),
        }
    }
}
