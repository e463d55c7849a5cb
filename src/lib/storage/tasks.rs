//! SQL for the `todos` table. Every function runs exactly one statement on the
//! request's connection; outside an explicit transaction SQLite commits it before
//! the call returns.

use sqlx::{FromRow, SqliteConnection};

use crate::core::{Task, TaskDescription, TodoError};

#[cfg(feature = "tracing")]
use tracing::debug;

// `task` and `completed` are nullable in the schema.
#[derive(FromRow)]
struct TaskRow {
    id: i64,
    task: Option<String>,
    completed: Option<i64>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            description: row.task.unwrap_or_default(),
            completed: row.completed.unwrap_or(0) != 0,
        }
    }
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Task>, TodoError> {
    let rows: Vec<TaskRow> = sqlx::query_as("SELECT id, task, completed FROM todos ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(Task::from).collect())
}

pub async fn insert(
    conn: &mut SqliteConnection,
    description: &TaskDescription,
) -> Result<Task, TodoError> {
    let result = sqlx::query("INSERT INTO todos (task) VALUES (?)")
        .bind(description.as_str())
        .execute(&mut *conn)
        .await?;
    let id = result.last_insert_rowid();
    #[cfg(feature = "tracing")]
    debug!(id, "Inserted task");
    Ok(Task {
        id,
        description: description.as_str().to_string(),
        completed: false,
    })
}

/// Marks the task completed. Returns `false` when no row has this id.
pub async fn complete(conn: &mut SqliteConnection, id: i64) -> Result<bool, TodoError> {
    let result = sqlx::query("UPDATE todos SET completed = 1 WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    #[cfg(feature = "tracing")]
    debug!(id, rows = result.rows_affected(), "Completed task");
    Ok(result.rows_affected() > 0)
}

/// Removes the task. Returns `false` when no row has this id.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, TodoError> {
    let result = sqlx::query("DELETE FROM todos WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    #[cfg(feature = "tracing")]
    debug!(id, rows = result.rows_affected(), "Deleted task");
    Ok(result.rows_affected() > 0)
}
