use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use evently_events::{
    ApnsClient, ApnsConfig, ChangeTriggers, DisabledPush, NotificationDispatcher, PushSink,
    RealtimeSink,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evently_api::background::recurrence;
use evently_api::config::{ConfigError, ServerConfig};
use evently_api::router::build_app_router;
use evently_api::state::AppState;
use evently_api::ws;

/// Reasons the server can fail to come up or to keep serving.
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migrations: {0}")]
    Migrations(#[from] sqlx::migrate::MigrateError),

    #[error("invalid bind address: {0}")]
    Address(#[from] AddrParseError),

    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "evently_api=debug,evently_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

    let pool = evently_db::create_pool(&database_url).await?;
    tracing::info!("Database connection pool created");

    evently_db::health_check(&pool).await?;
    tracing::info!("Database health check passed");

    evently_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Notifications ---
    let push = build_push_sink();
    let realtime: Arc<dyn RealtimeSink> = ws_manager.clone();
    let triggers = ChangeTriggers::new(pool.clone(), NotificationDispatcher::new(realtime, push));

    // --- Recurrence job ---
    let recurrence_cancel = CancellationToken::new();
    let recurrence_handle = tokio::spawn(recurrence::run(
        pool.clone(),
        triggers.clone(),
        Duration::from_secs(config.recurrence_interval_secs),
        recurrence_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        triggers,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    recurrence_cancel.cancel();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(shutdown_timeout, recurrence_handle)
        .await
        .is_err()
    {
        tracing::warn!("Recurrence job did not stop in time");
    }
    tracing::info!("Recurrence job stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// APNs when it is configured and its key loads, otherwise a sink that
/// drops every push. Realtime signals work either way.
fn build_push_sink() -> Arc<dyn PushSink> {
    let Some(apns) = ApnsConfig::from_env() else {
        tracing::info!("APNs not configured, push notifications disabled");
        return Arc::new(DisabledPush);
    };
    match ApnsClient::new(apns) {
        Ok(client) => {
            tracing::info!("APNs client ready");
            Arc::new(client)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialise APNs, push notifications disabled");
            Arc::new(DisabledPush)
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix). If a handler cannot
/// be installed, that branch never fires and the other one still does.
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
