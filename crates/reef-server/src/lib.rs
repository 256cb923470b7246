//! Reef multiplayer server.
//!
//! Matches are owned by one actor task each; the [`coordinator`] maps match
//! ids to those actors and fans state updates out to every connection.

pub mod actor;
pub mod config;
pub mod coordinator;
pub mod protocol;
pub mod room;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use coordinator::{ConnectionRegistry, MatchSettings, RoomCoordinator};
pub use protocol::{ClientMessage, ServerMessage};
pub use room::{ConnectionId, GameRoom, MatchId, RoomError, Seat};
