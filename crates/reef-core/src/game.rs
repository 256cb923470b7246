//! Core game state machine.
//!
//! This module contains the main `GameState` struct and all rule logic:
//! move validation, capture resolution, victory detection and turn flow.
//! Every `apply_*` validates fully before touching the state, so a refused
//! move leaves the state exactly as it was.

use crate::actions::{ActionChoice, GameEvent, LastMove, Move};
use crate::board::Board;
use crate::hex::{Direction, HexCoord};
use crate::player::{Color, Piece, PieceKind, ReservePools, Reserves, SharkKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Chain length needed to win
pub const WINNING_CHAIN_LENGTH: usize = 10;

/// Radius of the standard board (61 cells)
pub const BOARD_RADIUS: u32 = 4;

/// Where a big shark's second mouth sits relative to its first.
///
/// The printed rules do not pin this down, so it is a policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouthLayout {
    /// Mouths at `rotation` and `rotation + 1`
    #[default]
    Adjacent,
    /// Mouths at `rotation` and `rotation + 2`
    Spread,
    /// Mouths at `rotation` and `rotation + 3`
    Opposite,
}

impl MouthLayout {
    /// Offset of the second mouth from the first, in sixths of a turn
    pub const fn second_mouth_offset(self) -> u8 {
        match self {
            MouthLayout::Adjacent => 1,
            MouthLayout::Spread => 2,
            MouthLayout::Opposite => 3,
        }
    }
}

/// A mouth layout name that is not one of `adjacent`, `spread`, `opposite`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mouth layout '{0}'")]
pub struct UnknownMouthLayout(pub String);

impl std::str::FromStr for MouthLayout {
    type Err = UnknownMouthLayout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adjacent" => Ok(MouthLayout::Adjacent),
            "spread" => Ok(MouthLayout::Spread),
            "opposite" => Ok(MouthLayout::Opposite),
            other => Err(UnknownMouthLayout(other.to_string())),
        }
    }
}

/// Tunable rules for a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub board_radius: u32,
    pub winning_chain: usize,
    /// Starting supply for each color
    pub allotment: Reserves,
    /// Whether the two fish of one turn must touch each other
    pub fish_must_be_adjacent: bool,
    pub big_shark_mouths: MouthLayout,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            board_radius: BOARD_RADIUS,
            winning_chain: WINNING_CHAIN_LENGTH,
            allotment: Reserves::standard(),
            fish_must_be_adjacent: false,
            big_shark_mouths: MouthLayout::Adjacent,
        }
    }
}

impl RuleConfig {
    /// Mouth directions for a shark of `kind` facing `rotation`
    pub fn mouths(&self, kind: SharkKind, rotation: u8) -> Vec<Direction> {
        let first = Direction::from_index(rotation);
        match kind {
            SharkKind::Small => vec![first],
            SharkKind::Big => vec![
                first,
                first.rotate(self.big_shark_mouths.second_mouth_offset()),
            ],
        }
    }
}

/// Where the current player is within their turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TurnPhase {
    /// Choosing between a fish pair and a shark
    SelectAction,
    /// An action is chosen; waiting for its coordinates/rotation
    Acting { choice: ActionChoice },
    /// A winner is set; no further moves are accepted
    Finished,
}

/// Outcome of a finished match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    White,
    Black,
    Draw,
}

impl Winner {
    pub fn color(self) -> Option<Color> {
        match self {
            Winner::White => Some(Color::White),
            Winner::Black => Some(Color::Black),
            Winner::Draw => None,
        }
    }
}

impl From<Color> for Winner {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Winner::White,
            Color::Black => Winner::Black,
        }
    }
}

/// Reasons a move or selection is refused
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game is over")]
    GameOver,

    #[error("Cell {0} is not on the board")]
    OutOfBoard(HexCoord),

    #[error("Cell {0} is occupied")]
    CellOccupied(HexCoord),

    #[error("Both fish must go on different cells")]
    SameCell,

    #[error("The two fish must be placed next to each other")]
    FishNotAdjacent,

    #[error("No {0:?} left in reserve")]
    InsufficientReserve(PieceKind),

    #[error("Rotation {0} is not a direction (0-5)")]
    InvalidRotation(u8),

    #[error("Cannot eat your own piece")]
    CannotCaptureOwnPiece,

    #[error("Sharks cannot be eaten")]
    CannotCaptureShark,

    #[error("A shark must eat at least one opponent fish")]
    NoCapture,

    #[error("Move does not match the selected action {selected:?}")]
    SelectionMismatch { selected: ActionChoice },

    #[error("No action is selected")]
    NothingSelected,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// The game board
    pub board: Board,
    /// Rules this match is played under
    pub rules: RuleConfig,
    /// Whose turn it is
    pub current_player: Color,
    /// Progress within the current turn
    pub turn_phase: TurnPhase,
    /// Unplayed pieces per color
    pub reserves: ReservePools,
    /// Set once the match is decided
    pub winner: Option<Winner>,
    /// The last applied move, for client reconciliation
    pub last_move: Option<LastMove>,
    /// Number of applied moves
    pub turn_number: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

impl GameState {
    /// Create an empty game: all cells vacant, full reserves, white to move
    pub fn new(rules: RuleConfig) -> Self {
        Self {
            board: Board::new(rules.board_radius),
            rules,
            current_player: Color::White,
            turn_phase: TurnPhase::SelectAction,
            reserves: ReservePools::new(rules.allotment),
            winner: None,
            last_move: None,
            turn_number: 0,
        }
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    pub fn reserves_of(&self, color: Color) -> &Reserves {
        self.reserves.get(color)
    }

    /// The state as `viewer` may see it. A pending selection belongs to the
    /// player holding the turn; everyone else sees `SelectAction`.
    pub fn view_for(&self, viewer: Option<Color>) -> GameState {
        let mut view = self.clone();
        if matches!(view.turn_phase, TurnPhase::Acting { .. })
            && viewer != Some(view.current_player)
        {
            view.turn_phase = TurnPhase::SelectAction;
        }
        view
    }

    // ==================== Turn flow ====================

    /// Apply a complete move for `color`: validate, apply, re-evaluate
    /// victory, then either finish the game or pass the turn.
    pub fn apply_move(&mut self, color: Color, mv: Move) -> Result<Vec<GameEvent>, GameError> {
        self.check_turn(color)?;

        if let TurnPhase::Acting { choice } = self.turn_phase {
            if choice != mv.choice() {
                return Err(GameError::SelectionMismatch { selected: choice });
            }
        }

        let mut events = match mv {
            Move::PlaceFish { coords: [a, b] } => self.apply_fish_placement(color, a, b)?,
            Move::PlaceShark {
                coord,
                rotation,
                shark_kind,
            } => self.apply_shark_placement(color, coord, rotation, shark_kind)?,
        };

        let captured = events
            .iter()
            .filter_map(|event| match event {
                GameEvent::FishCaptured { coord, .. } => Some(*coord),
                _ => None,
            })
            .collect();
        self.last_move = Some(LastMove {
            color,
            mv,
            captured,
        });
        self.turn_number += 1;

        events.extend(self.conclude_turn(color));
        Ok(events)
    }

    /// Choose the action for this turn without completing it yet.
    /// Choosing again replaces the previous choice.
    pub fn select_action(&mut self, color: Color, choice: ActionChoice) -> Result<(), GameError> {
        self.check_turn(color)?;

        let (kind, needed) = match choice {
            ActionChoice::Fish => (PieceKind::Fish, 2),
            ActionChoice::Shark(kind) => (kind.into(), 1),
        };
        if !self.reserves_of(color).has(kind, needed) {
            return Err(GameError::InsufficientReserve(kind));
        }

        self.turn_phase = TurnPhase::Acting { choice };
        Ok(())
    }

    /// Drop the in-progress choice and go back to selecting
    pub fn cancel_selection(&mut self, color: Color) -> Result<(), GameError> {
        self.check_turn(color)?;
        if self.turn_phase == TurnPhase::SelectAction {
            return Err(GameError::NothingSelected);
        }
        self.turn_phase = TurnPhase::SelectAction;
        Ok(())
    }

    /// Pass the turn to the other color and reset the turn phase
    pub fn switch_turn(&mut self) {
        self.current_player = self.current_player.opponent();
        self.turn_phase = TurnPhase::SelectAction;
    }

    fn check_turn(&self, color: Color) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        if color != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    fn conclude_turn(&mut self, color: Color) -> Vec<GameEvent> {
        match self.check_victory() {
            Some(winner) => {
                self.winner = Some(winner);
                self.turn_phase = TurnPhase::Finished;
                let event = match winner.color() {
                    Some(color) => GameEvent::GameWon {
                        color,
                        chain: self.board.largest_chain(color),
                    },
                    None => GameEvent::GameDrawn {
                        chain: self.board.largest_chain(color),
                    },
                };
                vec![event]
            }
            None => {
                self.switch_turn();
                vec![GameEvent::TurnEnded {
                    color,
                    next: self.current_player,
                }]
            }
        }
    }

    // ==================== Fish ====================

    /// Check that `color` may place fish on `a` and `b`
    pub fn validate_fish_placement(
        &self,
        color: Color,
        a: HexCoord,
        b: HexCoord,
    ) -> Result<(), GameError> {
        for coord in [a, b] {
            let cell = self
                .board
                .get_cell(&coord)
                .ok_or(GameError::OutOfBoard(coord))?;
            if !cell.is_empty() {
                return Err(GameError::CellOccupied(coord));
            }
        }

        if a == b {
            return Err(GameError::SameCell);
        }

        if self.rules.fish_must_be_adjacent && !a.is_adjacent(&b) {
            return Err(GameError::FishNotAdjacent);
        }

        if !self.reserves_of(color).has(PieceKind::Fish, 2) {
            return Err(GameError::InsufficientReserve(PieceKind::Fish));
        }

        Ok(())
    }

    /// Place one fish on each coordinate and take two from the reserve
    pub fn apply_fish_placement(
        &mut self,
        color: Color,
        a: HexCoord,
        b: HexCoord,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.validate_fish_placement(color, a, b)?;

        self.board.place(a, Piece::fish(color));
        self.board.place(b, Piece::fish(color));
        self.reserves.get_mut(color).take(PieceKind::Fish, 2);

        Ok(vec![GameEvent::FishPlaced {
            color,
            coords: [a, b],
        }])
    }

    // ==================== Sharks ====================

    /// Check a shark placement and return the cells whose fish it eats.
    ///
    /// The fish under the shark (if any) comes first, then mouth captures
    /// in mouth order.
    pub fn validate_shark_placement(
        &self,
        color: Color,
        coord: HexCoord,
        rotation: u8,
        kind: SharkKind,
    ) -> Result<Vec<HexCoord>, GameError> {
        if rotation > 5 {
            return Err(GameError::InvalidRotation(rotation));
        }

        let cell = self
            .board
            .get_cell(&coord)
            .ok_or(GameError::OutOfBoard(coord))?;

        let mut captured = Vec::new();

        if let Some(occupant) = cell.piece {
            if occupant.color == color {
                return Err(GameError::CannotCaptureOwnPiece);
            }
            if !occupant.is_fish() {
                return Err(GameError::CannotCaptureShark);
            }
            captured.push(coord);
        }

        for mouth in self.rules.mouths(kind, rotation) {
            let target = coord.neighbor(mouth);
            if let Some(piece) = self.board.piece_at(&target) {
                if piece.color != color && piece.is_fish() && !captured.contains(&target) {
                    captured.push(target);
                }
            }
        }

        if captured.is_empty() {
            return Err(GameError::NoCapture);
        }

        let piece_kind = PieceKind::from(kind);
        if !self.reserves_of(color).has(piece_kind, 1) {
            return Err(GameError::InsufficientReserve(piece_kind));
        }

        Ok(captured)
    }

    /// Eat the captured fish (returning each to its owner's reserve), put
    /// the shark down and take it from the reserve
    pub fn apply_shark_placement(
        &mut self,
        color: Color,
        coord: HexCoord,
        rotation: u8,
        kind: SharkKind,
    ) -> Result<Vec<GameEvent>, GameError> {
        let captured = self.validate_shark_placement(color, coord, rotation, kind)?;

        let mut events = Vec::with_capacity(captured.len() + 1);
        for target in captured {
            if let Some(fish) = self.board.remove(&target) {
                self.reserves.get_mut(fish.color).add(PieceKind::Fish, 1);
                events.push(GameEvent::FishCaptured {
                    owner: fish.color,
                    coord: target,
                });
            }
        }

        self.board.place(coord, Piece::shark(kind, color, rotation));
        self.reserves.get_mut(color).take(kind.into(), 1);

        events.insert(
            0,
            GameEvent::SharkPlaced {
                color,
                kind,
                coord,
                rotation,
            },
        );
        Ok(events)
    }

    /// Every shark placement `color` could legally make right now
    pub fn legal_shark_placements(&self, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for cell in self.board.cells() {
            for shark_kind in SharkKind::ALL {
                for rotation in 0..6 {
                    if self
                        .validate_shark_placement(color, cell.coord, rotation, shark_kind)
                        .is_ok()
                    {
                        moves.push(Move::PlaceShark {
                            coord: cell.coord,
                            rotation,
                            shark_kind,
                        });
                    }
                }
            }
        }
        moves
    }

    // ==================== Victory ====================

    /// Compare each color's largest chain against the winning length
    pub fn check_victory(&self) -> Option<Winner> {
        let threshold = self.rules.winning_chain;
        let white = self.board.largest_chain(Color::White);
        let black = self.board.largest_chain(Color::Black);

        match (white >= threshold, black >= threshold) {
            (true, true) => match white.cmp(&black) {
                Ordering::Greater => Some(Winner::White),
                Ordering::Less => Some(Winner::Black),
                Ordering::Equal => Some(Winner::Draw),
            },
            (true, false) => Some(Winner::White),
            (false, true) => Some(Winner::Black),
            (false, false) => None,
        }
    }

    /// Pieces on the board plus pieces in reserve add up to the allotment
    /// for every color and kind, and no reserve exceeds it
    pub fn is_consistent(&self) -> bool {
        Color::ALL.iter().all(|&color| {
            let reserves = self.reserves_of(color);
            reserves.within(&self.rules.allotment)
                && PieceKind::ALL.iter().all(|&kind| {
                    let on_board = self
                        .board
                        .cells()
                        .iter()
                        .filter_map(|cell| cell.piece)
                        .filter(|p| p.color == color && p.kind == kind)
                        .count() as u32;
                    on_board + reserves.get(kind) == self.rules.allotment.get(kind)
                })
        })
    }
}
