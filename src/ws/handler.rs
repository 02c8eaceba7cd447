//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{Outbound, RoomCommand, RoomHandle};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, PlayerId, ServerMsg};

/// Errors on the outbound half of a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket send failed: {0}")]
    Send(#[from] axum::Error),
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let player_id = Uuid::new_v4();
    info!(player_id = %player_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();

    // Subscribe before joining so the seed messages are not missed
    let outbound_rx = state.room.subscribe();
    if !state.room.send(player_id, RoomCommand::Connect).await {
        error!(player_id = %player_id, "Room is not running");
        return;
    }

    let limiter = ConnectionRateLimiter::new(state.config.input_rate_limit);
    run_session(player_id, ws_sink, ws_stream, outbound_rx, &state.room, limiter).await;

    // Cleanup on disconnect
    state.room.send(player_id, RoomCommand::Disconnect).await;

    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    player_id: PlayerId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    mut outbound_rx: broadcast::Receiver<Outbound>,
    room: &RoomHandle,
    limiter: ConnectionRateLimiter,
) {
    // Spawn writer task: room broadcasts -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match outbound_rx.recv().await {
                Ok(outbound) => {
                    if !outbound.audience.includes(player_id) {
                        continue;
                    }
                    if let Err(e) = send_msg(&mut ws_sink, &outbound.msg).await {
                        debug!(player_id = %player_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        player_id = %player_id,
                        lagged_count = n,
                        "Client lagged, skipping {} messages", n
                    );
                    // Continue - don't disconnect for lag
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(player_id = %player_id, "Room channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> room
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !limiter.check_input() {
                    warn!(player_id = %player_id, "Rate limited input message");
                    continue;
                }

                match parse_client_msg(&text) {
                    Some(msg) => {
                        debug!(player_id = %player_id, ?msg, "Client message");
                        if !room.send(player_id, RoomCommand::Client(msg)).await {
                            debug!(player_id = %player_id, "Room command channel closed");
                            break;
                        }
                    }
                    None => {
                        warn!(player_id = %player_id, "Dropped malformed client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(player_id = %player_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(player_id = %player_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Abort writer task
    writer_handle.abort();
}

/// Decode a text frame; malformed frames are rejected, never defaulted
pub fn parse_client_msg(text: &str) -> Option<ClientMsg> {
    match serde_json::from_str::<ClientMsg>(text) {
        Ok(msg) => Some(msg),
        Err(e) => {
            debug!(error = %e, raw = text, "Failed to parse client message");
            None
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), SessionError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
