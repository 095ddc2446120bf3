//! Atelier HTTP server.
//!
//! Reads settings (see [`atelier::config`]), installs tracing, wires either
//! the in-memory or the `PostgreSQL` adapters, starts the invitation expiry
//! sweep, and serves the API until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use atelier::api::{AppPorts, AppState, router};
use atelier::config::Settings;
use atelier::identity::{adapters::memory::InMemoryIdentityDirectory, domain::UserProfile};
use atelier::notification::adapters::BroadcastNotificationSink;
use atelier::project::adapters::postgres::ProjectPgPool;
use atelier::telemetry::init_tracing;
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use secrecy::ExposeSecret;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(&settings.telemetry).context("failed to install tracing subscriber")?;

    let directory = Arc::new(InMemoryIdentityDirectory::new());
    if let Some(path) = settings.directory.seed_file.as_deref() {
        let seeded = seed_directory(&directory, path)?;
        info!(path, users = seeded, "identity directory seeded");
    }

    let sink = BroadcastNotificationSink::new(settings.notifications.channel_capacity);
    spawn_event_log(&sink);

    let ports = match settings.database.url.as_ref() {
        Some(url) => {
            let manager = ConnectionManager::<PgConnection>::new(url.expose_secret());
            let pool: ProjectPgPool = Pool::builder()
                .max_size(settings.database.pool_size)
                .build(manager)
                .context("failed to build database pool")?;
            info!(pool_size = settings.database.pool_size, "using PostgreSQL persistence");
            AppPorts::postgres(&pool, directory, Arc::new(sink))
        }
        None => {
            warn!("no database URL configured; state is kept in memory");
            AppPorts::in_memory(directory, Arc::new(sink))
        }
    };
    let state = Arc::new(AppState::new(ports, Arc::new(DefaultClock)));
    spawn_expiry_sweep(
        Arc::clone(&state),
        Duration::from_secs(settings.sweep.interval_secs.max(1)),
    );

    let address = settings
        .server
        .bind_address()
        .context("invalid server address")?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("shut down");
    Ok(())
}

fn seed_directory(directory: &InMemoryIdentityDirectory, path: &str) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read directory seed file {path}"))?;
    let profiles: Vec<UserProfile> =
        serde_json::from_str(&raw).context("failed to parse directory seed file")?;
    let count = profiles.len();
    for profile in profiles {
        directory
            .register(profile)
            .context("failed to register seeded user")?;
    }
    Ok(count)
}

/// Drops expired invitations on a fixed interval.
fn spawn_expiry_sweep(state: Arc<AppState>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(err) = state.invitations.purge_expired().await {
                warn!(error = %err, "invitation expiry sweep failed");
            }
        }
    });
}

/// Logs every published project event at debug level.
fn spawn_event_log(sink: &BroadcastNotificationSink) {
    let mut events = sink.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(event = event.name(), channel = %event.channel(), "project event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
}
