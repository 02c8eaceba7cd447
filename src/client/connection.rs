//! WebSocket session runner for the headless client

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::util::time::{tick_delta, tick_interval};
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::presentation::{Affordance, ClientAction, InputAction, PresentationLoop};
use super::surface::Surface;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The input source closed; the client is done
    InputClosed,
    /// The player asked to play again in reload mode
    Reload,
    ServerClosed,
}

/// Connect and play until the input source closes or the server goes away.
/// Reload requests start a fresh session with a new identity.
pub async fn run(
    config: &ClientConfig,
    inputs: &mut mpsc::Receiver<InputAction>,
    surface: &mut impl Surface,
) -> Result<(), ClientError> {
    loop {
        match run_session(config, inputs, surface).await? {
            SessionEnd::Reload => {
                info!("Reloading session");
            }
            end => {
                info!(?end, "Session ended");
                return Ok(());
            }
        }
    }
}

async fn run_session(
    config: &ClientConfig,
    inputs: &mut mpsc::Receiver<InputAction>,
    surface: &mut impl Surface,
) -> Result<SessionEnd, ClientError> {
    let (socket, _) = connect_async(config.server_url.as_str()).await?;
    info!(url = %config.server_url, "Connected to server");

    let (mut sink, mut stream) = socket.split();
    let mut view = PresentationLoop::new(config);
    let mut frames = interval(tick_interval(config.frame_rate));
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let dt = tick_delta(config.frame_rate);

    loop {
        tokio::select! {
            _ = frames.tick() => {
                for msg in view.frame(dt, surface) {
                    sink.send(encode(&msg)?).await?;
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerMsg>(&text) {
                    Ok(msg) => {
                        if let Some(affordance) = view.on_server_msg(msg) {
                            announce(affordance);
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to parse server message"),
                },
                Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::ServerClosed),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
            input = inputs.recv() => match input {
                Some(action) => match view.handle_input(action) {
                    Some(ClientAction::Send(msg)) => {
                        debug!(?msg, "Sending command");
                        sink.send(encode(&msg)?).await?;
                    }
                    Some(ClientAction::Reconnect) => {
                        let _ = sink.close().await;
                        return Ok(SessionEnd::Reload);
                    }
                    None => debug!(?action, "Input ignored"),
                },
                None => {
                    let _ = sink.close().await;
                    return Ok(SessionEnd::InputClosed);
                }
            },
        }
    }
}

fn encode(msg: &ClientMsg) -> Result<Message, ClientError> {
    Ok(Message::Text(serde_json::to_string(msg)?))
}

fn announce(affordance: Affordance) {
    match affordance {
        Affordance::ShowGameOver => info!("Game over! Enter 'r' to play again"),
        Affordance::HideGameOver => info!("Back in the game"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::client::surface::TraceSurface;
    use crate::config::{Config, ReplayMode};
    use crate::game::GameRoom;
    use crate::http::build_router;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    async fn start_server() -> std::net::SocketAddr {
        let config = Config::default();
        let (room, handle) = GameRoom::new(config.room_settings());
        tokio::spawn(room.run());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(AppState::new(config, handle));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn client_session_ends_when_inputs_close() {
        let addr = start_server().await;
        let config = ClientConfig {
            server_url: format!("ws://{}/ws", addr),
            ..ClientConfig::default()
        };

        let (tx, mut rx) = mpsc::channel(8);
        tx.send(InputAction::Right).await.unwrap();
        tx.send(InputAction::Shoot).await.unwrap();
        let mut surface = TraceSurface::default();

        let client = async {
            let result = run(&config, &mut rx, &mut surface).await;
            (result, surface.frames())
        };
        let closer = async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            drop(tx);
        };

        let ((result, frames), ()) = timeout(Duration::from_secs(5), async {
            tokio::join!(client, closer)
        })
        .await
        .expect("client did not stop");

        assert!(result.is_ok());
        assert!(frames > 0);
    }

    #[tokio::test]
    async fn reload_rejoins_with_a_new_identity() {
        let addr = start_server().await;
        let (mut observer, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();

        let config = ClientConfig {
            server_url: format!("ws://{}/ws", addr),
            replay: ReplayMode::Reload,
            ..ClientConfig::default()
        };
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(InputAction::Reset).await.unwrap();
        drop(tx);
        let mut surface = TraceSurface::default();

        let result = timeout(Duration::from_secs(5), run(&config, &mut rx, &mut surface))
            .await
            .expect("client did not stop");
        assert!(result.is_ok());

        let mut joined = Vec::new();
        let mut left = Vec::new();
        while left.len() < 2 {
            let frame = timeout(Duration::from_secs(2), observer.next())
                .await
                .expect("observer timed out")
                .expect("observer closed")
                .unwrap();
            let Message::Text(text) = frame else { continue };
            match serde_json::from_str::<ServerMsg>(&text).unwrap() {
                ServerMsg::NewPlayer { player } => joined.push(player.id),
                ServerMsg::PlayerDisconnected { id } => left.push(id),
                _ => {}
            }
        }

        assert_eq!(joined.len(), 2);
        assert_ne!(joined[0], joined[1]);
        joined.sort();
        left.sort();
        assert_eq!(joined, left);
    }

    #[tokio::test]
    async fn connecting_to_nothing_is_an_error() {
        let config = ClientConfig {
            server_url: "ws://127.0.0.1:1/ws".to_string(),
            ..ClientConfig::default()
        };
        let (_tx, mut rx) = mpsc::channel(1);
        let mut surface = TraceSurface::default();

        assert!(matches!(
            run(&config, &mut rx, &mut surface).await,
            Err(ClientError::WebSocket(_))
        ));
    }
}
