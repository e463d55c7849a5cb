use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use sqlx::{
    Sqlite, SqliteConnection, SqlitePool,
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::core::TodoError;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Hands out one datastore connection per request.
///
/// The manager never creates the datastore file; run
/// [`ensure_schema`](super::ensure_schema) first.
#[derive(Clone, Debug)]
pub struct ConnectionManager {
    pool: SqlitePool,
}

impl ConnectionManager {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, TodoError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .min_connections(0)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;
        #[cfg(feature = "tracing")]
        info!(url = %url, max_connections, "Connection manager ready");
        Ok(Self { pool })
    }

    pub async fn acquire(&self) -> Result<DbConn, TodoError> {
        let conn = self.pool.acquire().await?;
        #[cfg(feature = "tracing")]
        debug!(idle = self.pool.num_idle(), size = self.pool.size(), "Acquired connection");
        Ok(DbConn(conn))
    }

    pub async fn close(&self) {
        self.pool.close().await;
        #[cfg(feature = "tracing")]
        info!("Connection manager closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

/// A connection scoped to one request.
///
/// Dropping it returns the connection to the manager, whichever way the handler exits.
pub struct DbConn(PoolConnection<Sqlite>);

impl fmt::Debug for DbConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConn").finish_non_exhaustive()
    }
}

impl Deref for DbConn {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DbConn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<S> FromRequestParts<S> for DbConn
where
    ConnectionManager: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = TodoError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        ConnectionManager::from_ref(state).acquire().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ensure_schema;
    use tempfile::TempDir;

    #[tokio::test]
    async fn connect_does_not_create_the_datastore() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.db");
        let url = format!("sqlite://{}", path.display());

        assert!(ConnectionManager::connect(&url, 2).await.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn dropped_connections_return_to_the_pool() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("todos.db").display());
        ensure_schema(&url).await.unwrap();
        let connections = ConnectionManager::connect(&url, 1).await.unwrap();

        let first = connections.acquire().await.unwrap();
        drop(first);
        // Only one slot: this would time out if the first connection had leaked.
        let _second = connections.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn closed_manager_rejects_with_service_unavailable() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("todos.db").display());
        ensure_schema(&url).await.unwrap();
        let connections = ConnectionManager::connect(&url, 1).await.unwrap();

        connections.close().await;

        assert!(connections.is_closed());
        let err = connections.acquire().await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }
}
