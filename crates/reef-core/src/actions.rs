//! Moves players submit and the events they produce.

use crate::hex::HexCoord;
use crate::player::{Color, SharkKind};
use serde::{Deserialize, Serialize};

/// A complete move, as submitted by a seated player.
///
/// Wire shape:
/// - `{ "kind": "place_fish", "coords": [hex, hex] }`
/// - `{ "kind": "place_shark", "coord": hex, "rotation": 0..5, "sharkKind": "small" | "big" }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Move {
    /// Place two fish from the reserve on empty cells
    PlaceFish { coords: [HexCoord; 2] },

    /// Place a shark that must eat at least one opponent fish
    PlaceShark {
        coord: HexCoord,
        rotation: u8,
        #[serde(rename = "sharkKind")]
        shark_kind: SharkKind,
    },
}

impl Move {
    /// The action this move completes
    pub fn choice(&self) -> ActionChoice {
        match self {
            Move::PlaceFish { .. } => ActionChoice::Fish,
            Move::PlaceShark { shark_kind, .. } => ActionChoice::Shark(*shark_kind),
        }
    }
}

/// What a player chose to do this turn, before completing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionChoice {
    Fish,
    Shark(SharkKind),
}

/// The most recently applied move, kept for client reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMove {
    pub color: Color,
    #[serde(rename = "move")]
    pub mv: Move,
    /// Cells whose fish were eaten by this move
    pub captured: Vec<HexCoord>,
}

/// Events that occur as a result of moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Two fish were placed
    FishPlaced { color: Color, coords: [HexCoord; 2] },

    /// A shark was placed
    SharkPlaced {
        color: Color,
        kind: SharkKind,
        coord: HexCoord,
        rotation: u8,
    },

    /// A fish was eaten and returned to its owner's reserve
    FishCaptured { owner: Color, coord: HexCoord },

    /// Turn passed to the other color
    TurnEnded { color: Color, next: Color },

    /// A color completed a winning chain
    GameWon { color: Color, chain: usize },

    /// Both colors reached the same winning chain length
    GameDrawn { chain: usize },
}
