use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ama::room::repository::{InMemoryRoomRepository, PostgresRoomRepository};
use ama::{server, AppState, Config, RoomRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ama=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!("Starting Q&A server");

    let room_repository: Arc<dyn RoomRepository + Send + Sync> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url)
                .await
                .context("Failed to connect to database")?;
            sqlx::migrate!()
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Using PostgreSQL store");
            Arc::new(PostgresRoomRepository::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory store");
            Arc::new(InMemoryRoomRepository::new())
        }
    };

    let shutdown = CancellationToken::new();
    let (app_state, worker) = AppState::new(room_repository, config.delivery, shutdown.clone());
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!("Server running on http://{}", config.bind_address());

    server::serve(listener, app_state).await?;

    shutdown.cancel();
    let _ = worker_handle.await;
    info!("Server stopped");
    Ok(())
}
