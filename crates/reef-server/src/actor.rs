//! Match actor: the single writer for one match.
//!
//! Each match runs as its own task reading commands from a bounded queue.
//! Commands for one match are therefore applied strictly one at a time,
//! while different matches proceed in parallel.

use crate::coordinator::ConnectionRegistry;
use crate::protocol::ServerMessage;
use crate::room::{ConnectionId, GameRoom, MatchId, RoomError, Seat};
use reef_core::{ActionChoice, GameState, Move};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Commands a match actor understands
#[derive(Debug)]
pub enum MatchCommand {
    Join {
        connection: ConnectionId,
        respond: oneshot::Sender<Result<(Seat, GameState), RoomError>>,
    },

    SubmitMove {
        connection: ConnectionId,
        mv: Move,
        respond: oneshot::Sender<Result<GameState, RoomError>>,
    },

    /// `None` clears the current selection
    SelectAction {
        connection: ConnectionId,
        choice: Option<ActionChoice>,
        respond: oneshot::Sender<Result<GameState, RoomError>>,
    },

    Leave { connection: ConnectionId },

    Snapshot {
        respond: oneshot::Sender<GameState>,
    },

    Shutdown,
}

/// Handle for sending commands to a match actor
#[derive(Debug, Clone)]
pub struct MatchHandle {
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    pub async fn send(&self, command: MatchCommand) -> Result<(), RoomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RoomError::NotFound)
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Owns one `GameRoom` and applies commands to it in arrival order
pub struct MatchActor {
    room: GameRoom,
    inbox: mpsc::Receiver<MatchCommand>,
    outbox: Arc<ConnectionRegistry>,
    idle_timeout: Duration,
}

impl MatchActor {
    pub fn new(
        room: GameRoom,
        outbox: Arc<ConnectionRegistry>,
        queue_capacity: usize,
        idle_timeout: Duration,
    ) -> (Self, MatchHandle) {
        let (sender, inbox) = mpsc::channel(queue_capacity.max(1));
        let actor = Self {
            room,
            inbox,
            outbox,
            idle_timeout,
        };
        (actor, MatchHandle { sender })
    }

    /// Run until shut down, abandoned, or idle for too long
    pub async fn run(mut self) {
        info!(match_id = %self.room.id, "match started");

        loop {
            match tokio::time::timeout(self.idle_timeout, self.inbox.recv()).await {
                Ok(Some(command)) => {
                    if !self.handle(command) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    info!(match_id = %self.room.id, "match idle, closing");
                    break;
                }
            }
        }

        info!(match_id = %self.room.id, turns = self.room.state().turn_number, "match closed");
    }

    /// Apply one command. Returns false when the actor should stop.
    fn handle(&mut self, command: MatchCommand) -> bool {
        match command {
            MatchCommand::Join {
                connection,
                respond,
            } => {
                let was_member = self.room.seat_of(connection).is_some();
                let result = self.room.join(connection);

                if let Ok(seat) = &result {
                    if !was_member {
                        info!(match_id = %self.room.id, %connection, ?seat, "player joined");
                        self.broadcast(ServerMessage::PlayerJoined {
                            match_id: self.room.id.clone(),
                            color: *seat,
                        });
                    }
                }

                let view = |seat: Seat| (seat, self.room.state().view_for(seat.color()));
                let _ = respond.send(result.map(view));
            }

            MatchCommand::SubmitMove {
                connection,
                mv,
                respond,
            } => {
                let result = self.room.submit_move(connection, mv).map(|events| {
                    debug!(match_id = %self.room.id, %connection, ?events, "move applied");
                    let state = self.room.state().clone();
                    self.broadcast(ServerMessage::GameUpdate {
                        match_id: self.room.id.clone(),
                        state: state.clone(),
                    });
                    if let Some(winner) = state.winner {
                        info!(match_id = %self.room.id, ?winner, "match decided");
                    }
                    state
                });

                let _ = respond.send(result);
            }

            MatchCommand::SelectAction {
                connection,
                choice,
                respond,
            } => {
                let result = self
                    .room
                    .select_action(connection, choice)
                    .map(|()| self.room.state().clone());
                let _ = respond.send(result);
            }

            MatchCommand::Leave { connection } => {
                if self.room.leave(connection) {
                    debug!(match_id = %self.room.id, %connection, "spectator left");
                }
            }

            MatchCommand::Snapshot { respond } => {
                let _ = respond.send(self.room.state().clone());
            }

            MatchCommand::Shutdown => return false,
        }

        true
    }

    /// Fire-and-forget delivery to every member of the match
    fn broadcast(&self, msg: ServerMessage) {
        self.outbox.send_to_all(&self.room.members(), msg);
    }
}
