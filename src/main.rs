use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flashmind::config::Config;
use flashmind::state::AppState;
use flashmind::{db, handlers};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let config = Config::load();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter.as_str().into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  if config.api_token.is_none() {
    tracing::warn!("No API token configured; the API is open to anyone who can reach it");
  }

  let pool = db::init_db(&config.db_path).map_err(|e| {
    tracing::error!("Failed to initialize database at {}: {}", config.db_path.display(), e);
    e
  })?;

  let bind_addr = config.server_bind_addr();
  let app = handlers::router(AppState::new(pool, config));

  let listener = tokio::net::TcpListener::bind(&bind_addr).await.map_err(|e| {
    tracing::error!("Failed to bind to {}: {}", bind_addr, e);
    e
  })?;

  tracing::info!("Server running on http://{}", bind_addr);

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  tracing::info!("Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!("Failed to listen for shutdown signal: {}", e);
    std::future::pending::<()>().await;
  }
}
