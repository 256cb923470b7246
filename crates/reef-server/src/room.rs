//! Game room management: seats, spectators and the authoritative state.
//!
//! A `GameRoom` is plain data. It is owned by exactly one match actor,
//! which is what serializes access to it.

use rand::distributions::Alphanumeric;
use rand::Rng;
use reef_core::{ActionChoice, Color, GameError, GameEvent, GameState, Move, RuleConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifies one client connection
pub type ConnectionId = Uuid;

/// Length of generated match codes
const MATCH_ID_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Match not found")]
    NotFound,

    #[error("Match is full")]
    Full,

    #[error("Not seated in this match")]
    NotSeated,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game is over")]
    GameOver,

    #[error("Invalid move: {0}")]
    InvalidMove(#[from] GameError),

    #[error("Match is shutting down")]
    Closed,
}

/// Short, human-shareable match code such as `K3Q9ZD`.
///
/// Codes are random, not guaranteed unique; the coordinator retries on a
/// clash with a live match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MatchId(String);

impl MatchId {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let code: String = rng
            .sample_iter(&Alphanumeric)
            .take(MATCH_ID_LEN)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MatchId {
    fn from(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }
}

impl From<String> for MatchId {
    fn from(code: String) -> Self {
        Self::from(code.as_str())
    }
}

impl From<MatchId> for String {
    fn from(id: MatchId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The role a connection holds in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    White,
    Black,
    Spectator,
}

impl Seat {
    pub fn color(self) -> Option<Color> {
        match self {
            Seat::White => Some(Color::White),
            Seat::Black => Some(Color::Black),
            Seat::Spectator => None,
        }
    }
}

impl From<Color> for Seat {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Seat::White,
            Color::Black => Seat::Black,
        }
    }
}

/// A match: its state plus who is sitting where.
#[derive(Debug, Clone)]
pub struct GameRoom {
    pub id: MatchId,
    pub white: Option<ConnectionId>,
    pub black: Option<ConnectionId>,
    pub spectators: Vec<ConnectionId>,
    pub allow_spectators: bool,
    state: GameState,
}

impl GameRoom {
    /// Create a room with the creator seated as white
    pub fn new(id: MatchId, creator: ConnectionId, rules: RuleConfig, allow_spectators: bool) -> Self {
        Self {
            id,
            white: Some(creator),
            black: None,
            spectators: Vec::new(),
            allow_spectators,
            state: GameState::new(rules),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn seat_of(&self, connection: ConnectionId) -> Option<Seat> {
        if self.white == Some(connection) {
            Some(Seat::White)
        } else if self.black == Some(connection) {
            Some(Seat::Black)
        } else if self.spectators.contains(&connection) {
            Some(Seat::Spectator)
        } else {
            None
        }
    }

    /// Seat a connection: an open color seat first, otherwise spectator.
    /// A connection already in the room keeps its seat.
    pub fn join(&mut self, connection: ConnectionId) -> Result<Seat, RoomError> {
        if let Some(seat) = self.seat_of(connection) {
            return Ok(seat);
        }

        if self.white.is_none() {
            self.white = Some(connection);
            return Ok(Seat::White);
        }
        if self.black.is_none() {
            self.black = Some(connection);
            return Ok(Seat::Black);
        }
        if !self.allow_spectators {
            return Err(RoomError::Full);
        }

        self.spectators.push(connection);
        Ok(Seat::Spectator)
    }

    /// Drop a spectator. Seated players keep their seat; returns whether
    /// anything changed.
    pub fn leave(&mut self, connection: ConnectionId) -> bool {
        let before = self.spectators.len();
        self.spectators.retain(|&id| id != connection);
        before != self.spectators.len()
    }

    /// Everyone who receives broadcasts: both seats and all spectators
    pub fn members(&self) -> Vec<ConnectionId> {
        self.white
            .into_iter()
            .chain(self.black)
            .chain(self.spectators.iter().copied())
            .collect()
    }

    /// Resolve the sender to a color that currently holds the turn
    fn acting_color(&self, connection: ConnectionId) -> Result<Color, RoomError> {
        let color = self
            .seat_of(connection)
            .and_then(Seat::color)
            .ok_or(RoomError::NotSeated)?;

        if self.state.is_finished() {
            return Err(RoomError::GameOver);
        }
        if self.state.current_player != color {
            return Err(RoomError::NotYourTurn);
        }
        Ok(color)
    }

    /// Apply a move on behalf of a connection
    pub fn submit_move(
        &mut self,
        connection: ConnectionId,
        mv: Move,
    ) -> Result<Vec<GameEvent>, RoomError> {
        let color = self.acting_color(connection)?;
        Ok(self.state.apply_move(color, mv)?)
    }

    /// Choose (or with `None`, clear) the action for the sender's turn
    pub fn select_action(
        &mut self,
        connection: ConnectionId,
        choice: Option<ActionChoice>,
    ) -> Result<(), RoomError> {
        let color = self.acting_color(connection)?;
        match choice {
            Some(choice) => self.state.select_action(color, choice)?,
            None => self.state.cancel_selection(color)?,
        }
        Ok(())
    }
}
