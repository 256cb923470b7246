//! WebSocket server and connection handling.

use crate::coordinator::RoomCoordinator;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::room::{ConnectionId, MatchId, RoomError, Seat};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, coordinator: Arc<RoomCoordinator>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Reef server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, coordinator).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    coordinator: Arc<RoomCoordinator>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (connection, mut rx) = coordinator.connect();

    let welcome = ServerMessage::Welcome {
        connection_id: connection,
    };
    ws_sender
        .send(Message::Text(serde_json::to_string(&welcome)?))
        .await?;

    // Forward queued messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to encode {:?}: {}", msg, e),
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(connection, client_msg, &coordinator).await,
                Err(e) => {
                    warn!("Invalid message from {}: {}", connection, e);
                    coordinator.connections().send_to(
                        connection,
                        ServerMessage::Error {
                            message: format!("Malformed message: {e}"),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", connection);
                break;
            }
            Ok(Message::Ping(_)) => {
                coordinator
                    .connections()
                    .send_to(connection, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", connection, e);
                break;
            }
            _ => {}
        }
    }

    coordinator.disconnect(connection).await;
    send_task.abort();

    info!("Connection closed for {}", connection);
    Ok(())
}

/// Handle a client message.
///
/// Replies go only to the sender. Broadcasts to other match members are
/// issued by the match actor itself.
pub async fn handle_message(
    connection: ConnectionId,
    msg: ClientMessage,
    coordinator: &RoomCoordinator,
) {
    let reply = match msg {
        ClientMessage::CreateMatch => match coordinator.create_match(connection).await {
            Ok((match_id, state)) => ServerMessage::MatchCreated {
                match_id,
                color: Seat::White,
                state,
            },
            Err(e) => error_message(e),
        },

        ClientMessage::JoinMatch { match_id } => {
            match coordinator.join_match(&match_id, connection).await {
                Ok((color, state)) => ServerMessage::MatchJoined {
                    match_id,
                    color,
                    state,
                },
                Err(e) => error_message(e),
            }
        }

        ClientMessage::SubmitMove { match_id, mv } => {
            match coordinator.submit_move(&match_id, connection, mv).await {
                // The GameUpdate broadcast already reached the sender
                Ok(_) => return,
                Err(e) => rejection(match_id, e),
            }
        }

        ClientMessage::SelectAction { match_id, choice } => {
            match coordinator.select_action(&match_id, connection, choice).await {
                Ok(state) => ServerMessage::ActionSelected { match_id, state },
                Err(e) => rejection(match_id, e),
            }
        }

        ClientMessage::Ping => ServerMessage::Pong,
    };

    coordinator.connections().send_to(connection, reply);
}

/// Rule and turn violations are rejections; a missing match is an error
fn rejection(match_id: MatchId, e: RoomError) -> ServerMessage {
    match e {
        RoomError::NotFound | RoomError::Closed => error_message(e),
        e => {
            debug!(%match_id, "rejected: {}", e);
            ServerMessage::MoveRejected {
                match_id,
                reason: e.to_string(),
            }
        }
    }
}

fn error_message(e: RoomError) -> ServerMessage {
    ServerMessage::Error {
        message: e.to_string(),
    }
}
