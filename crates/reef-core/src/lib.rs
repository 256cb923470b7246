//! Reef - a two-player hex capture game engine
//!
//! This crate provides the core game logic for Reef, including:
//! - Hex coordinate system and board topology
//! - Board representation with fish and shark pieces
//! - Per-color reserves
//! - Game state machine with full rule enforcement (placement, capture, victory)
//!
//! # Architecture
//!
//! The engine is pure and synchronous: no I/O, no locking. The server crate
//! owns one `GameState` per match and funnels every mutation through it.
//!
//! # Modules
//!
//! - [`hex`]: Axial coordinates, directions and board regions
//! - [`board`]: Cells, pieces on cells, chain measurement
//! - [`player`]: Colors, piece kinds and reserves
//! - [`actions`]: Moves and the events they produce
//! - [`game`]: Rules, turn flow and victory

pub mod actions;
pub mod board;
pub mod game;
pub mod hex;
pub mod player;

// Re-export commonly used types
pub use actions::{ActionChoice, GameEvent, LastMove, Move};
pub use board::{Board, BoardError, BoardJson, Cell};
pub use game::{
    GameError, GameState, MouthLayout, RuleConfig, TurnPhase, UnknownMouthLayout, Winner,
    BOARD_RADIUS, WINNING_CHAIN_LENGTH,
};
pub use hex::{region, Direction, HexCoord, HexParseError, MAX_COORD};
pub use player::{Color, Piece, PieceKind, ReservePools, Reserves, SharkKind};
