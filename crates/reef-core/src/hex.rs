//! Hex coordinate system using axial coordinates (q, r).
//!
//! This module provides the board topology:
//! - `HexCoord`: Identifies individual cells
//! - `Direction`: The six fixed unit directions, indexed 0-5
//! - `region`: The hexagonal set of cells within a radius of the origin
//!
//! We use axial coordinates because they make neighbor calculations elegant.
//! The third cube coordinate `s` is derived, so `q + r + s = 0` always holds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the six unit directions around a hex.
///
/// The index order is fixed and is what shark rotations refer to:
/// rotation `n` points along `Direction::ALL[n]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Index 0: (+1, -1)
    NorthEast,
    /// Index 1: (+1, 0)
    East,
    /// Index 2: (0, +1)
    SouthEast,
    /// Index 3: (-1, +1)
    SouthWest,
    /// Index 4: (-1, 0)
    West,
    /// Index 5: (0, -1)
    NorthWest,
}

impl Direction {
    /// All directions in index order
    pub const ALL: [Direction; 6] = [
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Direction for an index; wraps modulo 6
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index % 6) as usize]
    }

    /// Index of this direction (0-5)
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Unit vector `(dq, dr)` for this direction
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (0, -1),
        }
    }

    /// Rotate clockwise by `steps` sixths of a turn
    pub const fn rotate(self, steps: u8) -> Self {
        Self::from_index(self.index() + steps % 6)
    }

    /// Direction pointing from `from` to an adjacent `to`, if they are adjacent
    pub fn between(from: HexCoord, to: HexCoord) -> Option<Self> {
        Self::ALL.into_iter().find(|dir| from.neighbor(*dir) == to)
    }
}

/// Largest magnitude accepted for `q` or `r`.
///
/// Within this bound `s`, neighbors and distances cannot overflow `i32`.
pub const MAX_COORD: i32 = i32::MAX / 4;

/// Error for coordinates that cannot name a cell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexParseError {
    #[error("invalid hex coordinate ({q}, {r}, {s}): q + r + s must be 0")]
    NotOnPlane { q: i32, r: i32, s: i32 },

    #[error("hex coordinate ({q}, {r}) is out of range")]
    OutOfRange { q: i32, r: i32 },
}

/// Axial coordinate for hex grid.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going southeast
/// - The third coordinate `s` (not stored) satisfies: q + r + s = 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "HexRepr", into = "HexRepr")]
pub struct HexCoord {
    /// Column (increases going east)
    pub q: i32,
    /// Row (increases going southeast)
    pub r: i32,
}

/// Wire form of a coordinate. `s` may be omitted by clients.
#[derive(Serialize, Deserialize)]
struct HexRepr {
    q: i32,
    r: i32,
    #[serde(default)]
    s: Option<i32>,
}

impl TryFrom<HexRepr> for HexCoord {
    type Error = HexParseError;

    fn try_from(repr: HexRepr) -> Result<Self, Self::Error> {
        match repr.s {
            Some(s) => HexCoord::from_cube(repr.q, repr.r, s),
            None => HexCoord::checked(repr.q, repr.r),
        }
    }
}

impl From<HexCoord> for HexRepr {
    fn from(hex: HexCoord) -> Self {
        HexRepr {
            q: hex.q,
            r: hex.r,
            s: Some(hex.s()),
        }
    }
}

impl HexCoord {
    /// The center of the board
    pub const ORIGIN: HexCoord = HexCoord::new(0, 0);

    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Create from axial coordinates, rejecting values beyond `MAX_COORD`
    pub fn checked(q: i32, r: i32) -> Result<Self, HexParseError> {
        if q.checked_abs().map_or(true, |q| q > MAX_COORD)
            || r.checked_abs().map_or(true, |r| r > MAX_COORD)
        {
            return Err(HexParseError::OutOfRange { q, r });
        }
        Ok(Self::new(q, r))
    }

    /// Create from full cube coordinates, checking the invariant
    pub fn from_cube(q: i32, r: i32, s: i32) -> Result<Self, HexParseError> {
        let sum = i64::from(q) + i64::from(r) + i64::from(s);
        if sum != 0 {
            return Err(HexParseError::NotOnPlane { q, r, s });
        }
        Self::checked(q, r)
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Get the neighbor in a specific direction
    pub const fn neighbor(&self, direction: Direction) -> HexCoord {
        let (dq, dr) = direction.offset();
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// The six neighboring hexes in direction index order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        Direction::ALL.map(|dir| self.neighbor(dir))
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let (q1, r1) = (i64::from(self.q), i64::from(self.r));
        let (q2, r2) = (i64::from(other.q), i64::from(other.r));
        let dq = (q1 - q2).abs();
        let dr = (r1 - r2).abs();
        let ds = ((q1 + r1) - (q2 + r2)).abs();
        u32::try_from((dq + dr + ds) / 2).unwrap_or(u32::MAX)
    }

    /// Whether `other` shares an edge with this hex
    pub fn is_adjacent(&self, other: &HexCoord) -> bool {
        self.distance_to(other) == 1
    }

    /// Cells along a straight line from this hex, excluding the start
    pub fn line(&self, direction: Direction, length: usize) -> Vec<HexCoord> {
        let mut line = Vec::with_capacity(length);
        let mut current = *self;
        for _ in 0..length {
            current = current.neighbor(direction);
            line.push(current);
        }
        line
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = -i64::from(self.q) - i64::from(self.r);
        write!(f, "({}, {}, {})", self.q, self.r, s)
    }
}

/// All coordinates within `radius` steps of the origin.
///
/// Contains `3 * radius^2 + 3 * radius + 1` cells, ordered by `q` then `r`.
/// Radii beyond `MAX_COORD` are clamped to it.
pub fn region(radius: u32) -> Vec<HexCoord> {
    let radius = i32::try_from(radius).map_or(MAX_COORD, |r| r.min(MAX_COORD));
    let mut cells = Vec::new();
    for q in -radius..=radius {
        let r1 = (-radius).max(-q - radius);
        let r2 = radius.min(-q + radius);
        for r in r1..=r2 {
            cells.push(HexCoord::new(q, r));
        }
    }
    cells
}
