//! Headless judge device or display.
//!
//! Polls the server and logs the side effects a real device would render.
//! Commands are read line by line from stdin:
//! `1`/`2`/`3`/`0` vote, `yo` sends a pulse, `reset` starts a new round.
//! Runs until Ctrl-C.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ippon::client::HttpClient;
use ippon::config::AgentConfig;
use ippon::sync::{Command, SideEffect, SyncAgent};

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_lowercase().as_str() {
        "yo" | "pulse" => Some(Command::Pulse),
        "reset" => Some(Command::Reset),
        other => other
            .parse::<u8>()
            .ok()
            .map(|points| Command::Vote { points }),
    }
}

fn render(effect: &SideEffect) {
    match effect {
        SideEffect::SessionStarted {
            session_id,
            round_number,
        } => tracing::info!(?session_id, round_number, "Round started"),
        SideEffect::VoteChime { total_votes } => tracing::info!(total_votes, "*ding*"),
        SideEffect::ThresholdReached { total_votes } => {
            tracing::info!(total_votes, "IPPON!")
        }
        SideEffect::PlayPulse { pulse_id, judge_id } => {
            tracing::info!(pulse_id, judge_id, "YO!")
        }
        SideEffect::ControlsLocked { points } => tracing::info!(points, "Vote controls locked"),
        SideEffect::ControlsUnlocked => tracing::info!("Vote controls unlocked"),
        SideEffect::VoteAccepted { points } => tracing::info!(points, "Vote accepted"),
        SideEffect::VoteRejected { reason } => tracing::warn!("Vote rejected: {}", reason),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ippon=debug,ippon_agent=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env()?;
    let client = HttpClient::new(config.server_url.clone(), config.http_timeout)
        .context("Failed to create HTTP client")?;

    let agent = SyncAgent::new(client, config.role);
    let mut effects = agent.subscribe();
    let (commands_tx, commands_rx) = mpsc::channel(16);

    let runner = tokio::spawn(agent.run(
        config.poll_interval,
        config.pulse_poll_interval,
        commands_rx,
    ));

    tokio::spawn(async move {
        loop {
            match effects.recv().await {
                Ok(effect) => render(&effect),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Dropped {} side effects", n)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let input = async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(command) => {
                    if commands_tx.send(command).await.is_err() {
                        break;
                    }
                }
                None => tracing::warn!("Unknown command '{}'", line.trim()),
            }
        }
        // No more input (e.g. a display started without a terminal): keep polling
        std::future::pending::<()>().await;
        Ok::<(), anyhow::Error>(())
    };

    // Dropping the input future closes the command channel and stops the agent
    tokio::select! {
        result = input => result?,
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Interrupted, shutting down");
        }
    }

    let view = runner.await.context("Agent task failed")?;
    tracing::info!(round_number = view.round_number, "Agent stopped");
    Ok(())
}
