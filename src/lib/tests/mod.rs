
use tempfile::TempDir;

use crate::storage::{ConnectionManager, ensure_schema};

/// A bootstrapped datastore in its own temp directory. Keep the `TempDir` alive for the
/// duration of the test.
pub(crate) async fn temp_store() -> (ConnectionManager, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let url = format!("sqlite://{}", dir.path().join("todos.db").display());
    ensure_schema(&url).await.expect("bootstrap temp store");
    let connections = ConnectionManager::connect(&url, 4)
        .await
        .expect("connect temp store");
    (connections, dir)
}
