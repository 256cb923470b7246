//! Room coordinator: the registry of live matches and connections.
//!
//! The coordinator never touches a `GameState` directly. It resolves a match
//! id to its actor handle and forwards the request; the actor does the work.

use crate::actor::{MatchActor, MatchCommand, MatchHandle};
use crate::protocol::ServerMessage;
use crate::room::{ConnectionId, GameRoom, MatchId, RoomError, Seat};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use reef_core::{ActionChoice, GameState, Move, RuleConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use uuid::Uuid;

/// Per-match settings applied when a match is created
#[derive(Debug, Clone, Copy)]
pub struct MatchSettings {
    pub rules: RuleConfig,
    pub allow_spectators: bool,
    /// Matches with no traffic for this long are closed
    pub idle_timeout: Duration,
    /// Capacity of each match's command queue
    pub queue_capacity: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            rules: RuleConfig::default(),
            allow_spectators: true,
            idle_timeout: Duration::from_secs(3600),
            queue_capacity: 64,
        }
    }
}

/// Outgoing message channels, one per live connection
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    senders: DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and return its id and message stream
    pub fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(id, tx);
        (id, rx)
    }

    pub fn unregister(&self, connection: ConnectionId) {
        self.senders.remove(&connection);
    }

    /// Send a message to a specific connection. Never blocks; a closed or
    /// unknown connection is skipped.
    pub fn send_to(&self, connection: ConnectionId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&connection) {
            let _ = sender.send(msg);
        }
    }

    /// Send a message to every listed connection
    pub fn send_to_all(&self, connections: &[ConnectionId], msg: ServerMessage) {
        for connection in connections {
            self.send_to(*connection, msg.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// Owns every live match; the only way to reach a match's state.
pub struct RoomCoordinator {
    settings: MatchSettings,
    matches: DashMap<MatchId, MatchHandle>,
    /// Matches each connection has created or joined
    memberships: DashMap<ConnectionId, Vec<MatchId>>,
    connections: Arc<ConnectionRegistry>,
}

impl RoomCoordinator {
    pub fn new(settings: MatchSettings) -> Self {
        Self {
            settings,
            matches: DashMap::new(),
            memberships: DashMap::new(),
            connections: Arc::new(ConnectionRegistry::new()),
        }
    }

    pub fn connections(&self) -> &Arc<ConnectionRegistry> {
        &self.connections
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Number of matches currently registered
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Register a connection for outgoing messages
    pub fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        self.connections.register()
    }

    /// Forget a connection. Spectator seats are released; player seats stay.
    pub async fn disconnect(&self, connection: ConnectionId) {
        self.connections.unregister(connection);

        let joined = self
            .memberships
            .remove(&connection)
            .map(|(_, ids)| ids)
            .unwrap_or_default();

        for match_id in joined {
            if let Some(handle) = self.handle(&match_id) {
                let _ = handle.send(MatchCommand::Leave { connection }).await;
            }
        }
    }

    /// Create a new match with `creator` seated as white
    pub async fn create_match(
        &self,
        creator: ConnectionId,
    ) -> Result<(MatchId, GameState), RoomError> {
        let settings = self.settings;
        let (match_id, actor) = loop {
            let candidate = MatchId::generate(&mut rand::thread_rng());
            match self.matches.entry(candidate.clone()) {
                Entry::Occupied(_) => {
                    debug!(match_id = %candidate, "match id clash, retrying");
                }
                Entry::Vacant(slot) => {
                    let room = GameRoom::new(
                        candidate.clone(),
                        creator,
                        settings.rules,
                        settings.allow_spectators,
                    );
                    let (actor, handle) = MatchActor::new(
                        room,
                        Arc::clone(&self.connections),
                        settings.queue_capacity,
                        settings.idle_timeout,
                    );
                    slot.insert(handle);
                    break (candidate, actor);
                }
            }
        };

        tokio::spawn(actor.run());
        self.remember(creator, &match_id);
        info!(%match_id, %creator, "match created");

        let state = self.snapshot(&match_id).await?;
        Ok((match_id, state))
    }

    /// Join a match: black if open, otherwise spectator. The returned state
    /// hides another player's pending selection.
    pub async fn join_match(
        &self,
        match_id: &MatchId,
        connection: ConnectionId,
    ) -> Result<(Seat, GameState), RoomError> {
        let joined = self
            .request(match_id, |respond| MatchCommand::Join {
                connection,
                respond,
            })
            .await??;
        self.remember(connection, match_id);
        Ok(joined)
    }

    /// Submit a move; on success every member has been sent the new state
    pub async fn submit_move(
        &self,
        match_id: &MatchId,
        connection: ConnectionId,
        mv: Move,
    ) -> Result<GameState, RoomError> {
        self.request(match_id, |respond| MatchCommand::SubmitMove {
            connection,
            mv,
            respond,
        })
        .await?
    }

    /// Choose or clear the action for the sender's current turn
    pub async fn select_action(
        &self,
        match_id: &MatchId,
        connection: ConnectionId,
        choice: Option<ActionChoice>,
    ) -> Result<GameState, RoomError> {
        self.request(match_id, |respond| MatchCommand::SelectAction {
            connection,
            choice,
            respond,
        })
        .await?
    }

    /// Full authoritative state of a match, for server-side use
    pub async fn snapshot(&self, match_id: &MatchId) -> Result<GameState, RoomError> {
        self.request(match_id, |respond| MatchCommand::Snapshot { respond })
            .await
    }

    /// Drop registry entries whose actor has stopped. Returns how many.
    pub fn reap_closed(&self) -> usize {
        let before = self.matches.len();
        self.matches.retain(|_, handle| !handle.is_closed());
        let reaped = before.saturating_sub(self.matches.len());
        if reaped > 0 {
            info!(reaped, "removed closed matches");
        }
        reaped
    }

    /// Stop every match actor and clear the registry
    pub async fn shutdown(&self) {
        let handles: Vec<MatchHandle> = self
            .matches
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.matches.clear();
        self.memberships.clear();

        for handle in handles {
            let _ = handle.send(MatchCommand::Shutdown).await;
        }
        info!("coordinator shut down");
    }

    fn handle(&self, match_id: &MatchId) -> Option<MatchHandle> {
        self.matches.get(match_id).map(|entry| entry.value().clone())
    }

    fn remember(&self, connection: ConnectionId, match_id: &MatchId) {
        let mut joined = self.memberships.entry(connection).or_default();
        if !joined.contains(match_id) {
            joined.push(match_id.clone());
        }
    }

    /// Send a command to a match and wait for its reply
    async fn request<T>(
        &self,
        match_id: &MatchId,
        command: impl FnOnce(oneshot::Sender<T>) -> MatchCommand,
    ) -> Result<T, RoomError> {
        let handle = self.handle(match_id).ok_or(RoomError::NotFound)?;
        let (respond, reply) = oneshot::channel();

        if handle.send(command(respond)).await.is_err() {
            self.matches.remove(match_id);
            return Err(RoomError::NotFound);
        }

        reply.await.map_err(|_| RoomError::Closed)
    }
}
