//! WebSocket protocol messages for Reef multiplayer.

use crate::room::{ConnectionId, MatchId, Seat};
use reef_core::{ActionChoice, GameState, Move};
use serde::{Deserialize, Serialize};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new match; the creator plays white
    CreateMatch,

    /// Join an existing match as black or as a spectator
    JoinMatch { match_id: MatchId },

    /// Submit a complete move
    SubmitMove {
        match_id: MatchId,
        #[serde(rename = "move")]
        mv: Move,
    },

    /// Choose the action for this turn, or clear it with `null`
    SelectAction {
        match_id: MatchId,
        choice: Option<ActionChoice>,
    },

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned connection ID
    Welcome { connection_id: ConnectionId },

    /// Match created; the creator is seated white
    MatchCreated {
        match_id: MatchId,
        color: Seat,
        state: GameState,
    },

    /// Joined a match
    MatchJoined {
        match_id: MatchId,
        color: Seat,
        state: GameState,
    },

    /// Someone took a seat or started spectating
    PlayerJoined { match_id: MatchId, color: Seat },

    /// Authoritative state after an applied move
    GameUpdate { match_id: MatchId, state: GameState },

    /// Turn selection changed (sent to the selecting player only)
    ActionSelected { match_id: MatchId, state: GameState },

    /// The submitted move or selection was refused; state is unchanged
    MoveRejected { match_id: MatchId, reason: String },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}
