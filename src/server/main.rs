use prk_todo::adapters::{AppState, HttpServer};
use prk_todo::config::Config;
use prk_todo::storage::{ConnectionManager, ensure_schema};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    // Nothing is served until the schema is in place.
    let _outcome = ensure_schema(&config.database_url).await?;
    #[cfg(not(feature = "tracing"))]
    println!("{_outcome}");

    let connections = ConnectionManager::connect(&config.database_url, config.max_connections).await?;
    let state = AppState::new(connections, config.missing_task);
    let server = HttpServer::new(state, config.addr).await?;
    server.run().await
}
