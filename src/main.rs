use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ippon::{abuse, api, config::ServerConfig, persist, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ippon=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Ippon...");

    let config = ServerConfig::from_env()?;

    let mut state = AppState::with_roster(config.roster(), config.rules);
    if config.pulse_rate_max > 0 {
        let throttle = abuse::PulseThrottle::new(config.pulse_rate_max, config.pulse_rate_window);
        abuse::spawn_throttle_pruning(throttle.clone(), Duration::from_secs(60));
        state = state.with_pulse_throttle(throttle);
    }
    let state = Arc::new(state);

    if let Some(path) = &config.state_file {
        match persist::restore(&state, path).await {
            Ok(true) => tracing::info!(path = %path.display(), "Ledger restored from snapshot"),
            Ok(false) => tracing::info!(path = %path.display(), "No snapshot yet, starting empty"),
            // A bad snapshot is left on disk for inspection; the first write replaces it
            Err(e) => tracing::error!("Ignoring snapshot: {}", e),
        }
        persist::spawn_snapshot_writer(state.clone(), path.clone(), config.snapshot_interval)
            .await;
    }

    let app = api::build_router(state, config.request_timeout);

    tracing::info!("Listening on http://{}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
