//! Headless arena client
//!
//! Reads one command per line from stdin (`a`/`d` move, `w` jump, `f` shoot,
//! `r` play again) and runs the presentation loop against the server.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_shooter::client::{self, InputAction, TraceSurface};
use arena_shooter::config::ClientConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env()?;
    init_tracing(&config.log_level);

    info!("Connecting to: {}", config.server_url);
    info!("Controls: a/d to move, w to jump, f to shoot, r to play again");

    let (input_tx, mut input_rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<InputAction>() {
                Ok(action) => {
                    if input_tx.send(action).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Unrecognized input"),
            }
        }
    });

    let mut surface = TraceSurface::default();
    client::run(&config, &mut input_rx, &mut surface).await?;

    info!(frames = surface.frames(), "Client stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
