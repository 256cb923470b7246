//! Player colors, pieces, and reserve management.
//!
//! This module contains:
//! - `Color` for the two sides
//! - `PieceKind` and `Piece` for what sits on a cell
//! - `Reserves` for the per-color supply of unplayed pieces

use serde::{Deserialize, Serialize};

/// The two sides of a match. White always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Both colors, white first
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    /// The other side
    pub const fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Kinds of piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceKind {
    /// Placed two at a time; the only thing sharks can eat
    Fish,
    /// Shark with a single mouth
    SmallShark,
    /// Shark with two mouths
    BigShark,
}

impl PieceKind {
    pub const ALL: [PieceKind; 3] = [PieceKind::Fish, PieceKind::SmallShark, PieceKind::BigShark];

    pub fn is_shark(&self) -> bool {
        !matches!(self, PieceKind::Fish)
    }
}

/// Shark sizes as they appear in a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharkKind {
    Small,
    Big,
}

impl SharkKind {
    pub const ALL: [SharkKind; 2] = [SharkKind::Small, SharkKind::Big];
}

impl From<SharkKind> for PieceKind {
    fn from(kind: SharkKind) -> Self {
        match kind {
            SharkKind::Small => PieceKind::SmallShark,
            SharkKind::Big => PieceKind::BigShark,
        }
    }
}

/// A piece on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    /// Direction index (0-5) of the first mouth. Always 0 for fish.
    pub rotation: u8,
}

impl Piece {
    pub fn fish(color: Color) -> Self {
        Self {
            kind: PieceKind::Fish,
            color,
            rotation: 0,
        }
    }

    pub fn shark(kind: SharkKind, color: Color, rotation: u8) -> Self {
        Self {
            kind: kind.into(),
            color,
            rotation,
        }
    }

    pub fn is_fish(&self) -> bool {
        self.kind == PieceKind::Fish
    }
}

/// Unplayed pieces held by one color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub fish: u32,
    pub small_shark: u32,
    pub big_shark: u32,
}

impl Reserves {
    /// Create reserves with specific amounts
    pub const fn with_amounts(fish: u32, small_shark: u32, big_shark: u32) -> Self {
        Self {
            fish,
            small_shark,
            big_shark,
        }
    }

    /// The standard starting supply: 14 fish, 3 small and 3 big sharks
    pub const fn standard() -> Self {
        Self::with_amounts(14, 3, 3)
    }

    /// Get count of a specific piece kind
    pub fn get(&self, kind: PieceKind) -> u32 {
        match kind {
            PieceKind::Fish => self.fish,
            PieceKind::SmallShark => self.small_shark,
            PieceKind::BigShark => self.big_shark,
        }
    }

    fn slot(&mut self, kind: PieceKind) -> &mut u32 {
        match kind {
            PieceKind::Fish => &mut self.fish,
            PieceKind::SmallShark => &mut self.small_shark,
            PieceKind::BigShark => &mut self.big_shark,
        }
    }

    /// Check if at least `amount` of `kind` is available
    pub fn has(&self, kind: PieceKind, amount: u32) -> bool {
        self.get(kind) >= amount
    }

    /// Remove pieces from the supply. Returns false and leaves the supply
    /// untouched if there are not enough.
    pub fn take(&mut self, kind: PieceKind, amount: u32) -> bool {
        let slot = self.slot(kind);
        match slot.checked_sub(amount) {
            Some(left) => {
                *slot = left;
                true
            }
            None => false,
        }
    }

    /// Return pieces to the supply
    pub fn add(&mut self, kind: PieceKind, amount: u32) {
        *self.slot(kind) += amount;
    }

    /// Total pieces left
    pub fn total(&self) -> u32 {
        self.fish + self.small_shark + self.big_shark
    }

    /// Whether every count is within the given allotment
    pub fn within(&self, allotment: &Reserves) -> bool {
        PieceKind::ALL
            .iter()
            .all(|kind| self.get(*kind) <= allotment.get(*kind))
    }
}

/// Reserves for both colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservePools {
    pub white: Reserves,
    pub black: Reserves,
}

impl ReservePools {
    /// Fresh pools, each a copy of the allotment
    pub fn new(allotment: Reserves) -> Self {
        Self {
            white: allotment,
            black: allotment,
        }
    }

    pub fn get(&self, color: Color) -> &Reserves {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn get_mut(&mut self, color: Color) -> &mut Reserves {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}
