//! Startup check that the datastore file and the `todos` table exist.
//!
//! [`ensure_schema`] is safe to run against a store that is already initialized: the schema
//! script only uses `CREATE TABLE IF NOT EXISTS`, so existing rows are never touched.

use std::fmt;

use sqlx::{Connection, Sqlite, SqliteConnection, migrate::MigrateDatabase};

use crate::core::TodoError;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

const SCHEMA: &str = include_str!("schema.sql");

pub const TASK_TABLE: &str = "todos";

/// What [`ensure_schema`] had to do before the store was usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The datastore file was missing and has been created with the schema.
    Created,
    /// File and table were already present.
    Existing,
    /// The file existed without the task table; the table has been created.
    Repaired,
}

impl fmt::Display for BootstrapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapOutcome::Created => write!(f, "datastore created and initialized"),
            BootstrapOutcome::Existing => write!(f, "datastore and '{TASK_TABLE}' table already exist"),
            BootstrapOutcome::Repaired => {
                write!(f, "datastore existed without '{TASK_TABLE}' table; schema applied")
            }
        }
    }
}

fn failed(stage: &'static str) -> impl FnOnce(sqlx::Error) -> TodoError {
    move |source| TodoError::Bootstrap { stage, source }
}

pub async fn ensure_schema(url: &str) -> Result<BootstrapOutcome, TodoError> {
    let existed = Sqlite::database_exists(url)
        .await
        .map_err(failed("checking for the datastore"))?;
    if !existed {
        #[cfg(feature = "tracing")]
        info!(url = %url, "Datastore does not exist, creating");
        Sqlite::create_database(url)
            .await
            .map_err(failed("creating the datastore"))?;
    }

    let mut conn = SqliteConnection::connect(url)
        .await
        .map_err(failed("opening the datastore"))?;

    let outcome = if !existed {
        apply_schema(&mut conn).await?;
        BootstrapOutcome::Created
    } else if table_exists(&mut conn)
        .await
        .map_err(failed("inspecting sqlite_master"))?
    {
        BootstrapOutcome::Existing
    } else {
        apply_schema(&mut conn).await?;
        BootstrapOutcome::Repaired
    };

    conn.close()
        .await
        .map_err(failed("closing the bootstrap connection"))?;

    #[cfg(feature = "tracing")]
    info!(url = %url, outcome = ?outcome, "{}", outcome);
    Ok(outcome)
}

pub async fn table_exists(conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(TASK_TABLE)
            .fetch_optional(&mut *conn)
            .await?;
    #[cfg(feature = "tracing")]
    debug!(table = TASK_TABLE, exists = row.is_some(), "Checked for task table");
    Ok(row.is_some())
}

async fn apply_schema(conn: &mut SqliteConnection) -> Result<(), TodoError> {
    sqlx::raw_sql(SCHEMA)
        .execute(&mut *conn)
        .await
        .map_err(failed("running the schema script"))?;
    Ok(())
}
