//! # FamSync API Server
//!
//! Family task-management API: users register, form family groups, and
//! assign and track tasks (with tags, due dates, priorities, and recurring
//! routine tasks) among family members.
//!
//! ## Startup sequence
//!
//! 1. Load configuration from the environment, a missing `SECRET_KEY` or
//!    `DATABASE_URL` is fatal; the process never serves with defaults.
//! 2. Create the connection pool and run pending migrations.
//! 3. Reset completed routine tasks (best-effort; a failure here is logged
//!    and must not block serving).
//! 4. Build the router and serve until ctrl-c.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p famsync-api
//! ```

use famsync_api::{
    app::{build_router, AppState},
    config::Config,
};
use famsync_shared::{
    db::{migrations::run_migrations, pool::create_pool, pool::DatabaseConfig},
    models::task::Task,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "famsync_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "FamSync API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    // Best-effort: a failed sweep must not keep the server from starting
    match Task::reset_completed_routines(&pool).await {
        Ok(count) => tracing::info!(count, "Startup routine-task reset complete"),
        Err(e) => tracing::warn!("Startup routine-task reset failed: {}", e),
    }

    let bind_address = config.bind_address();
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received, exiting...");
}
