use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use campusdesk_api::config::ServerConfig;
use campusdesk_api::router::build_app_router;
use campusdesk_api::state::AppState;
use campusdesk_core::clock::SystemClock;
use campusdesk_db::{PgCategoryDirectory, PgTicketStore};
use campusdesk_engine::{EscalationScheduler, TicketService};
use campusdesk_events::{EventBus, OutboxPersistence};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "campusdesk_api=debug,campusdesk_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = campusdesk_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    campusdesk_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    campusdesk_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let persistence_handle = tokio::spawn(OutboxPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
    ));

    // --- Ticket service ---
    let service = Arc::new(TicketService::new(
        Arc::new(PgTicketStore::new(pool.clone())),
        Arc::new(PgCategoryDirectory::new(pool.clone())),
        Arc::new(SystemClock),
        Arc::clone(&event_bus),
        &config.engine,
    ));

    // --- Escalation scheduler ---
    let scheduler_cancel = CancellationToken::new();
    let scheduler_handle = if config.engine.scheduler_enabled {
        let scheduler = EscalationScheduler::new(Arc::clone(&service), &config.engine);
        let cancel = scheduler_cancel.clone();
        Some(tokio::spawn(async move { scheduler.run(cancel).await }))
    } else {
        tracing::warn!("Escalation scheduler disabled by configuration");
        None
    };

    // --- Router ---
    let state = AppState {
        service,
        config: Arc::new(config.clone()),
        pool: Some(pool),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let drain = Duration::from_secs(config.shutdown_timeout_secs);

    // The scheduler finishes in-flight escalations before returning.
    scheduler_cancel.cancel();
    if let Some(handle) = scheduler_handle {
        if tokio::time::timeout(drain, handle).await.is_err() {
            tracing::warn!("Escalation scheduler did not stop within the shutdown timeout");
        }
    }

    // Dropping the last sender closes the channel and ends persistence.
    drop(event_bus);
    if tokio::time::timeout(drain, persistence_handle).await.is_err() {
        tracing::warn!("Outbox persistence did not drain within the shutdown timeout");
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
