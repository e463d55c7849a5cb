use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Task {0} not found")]
    NotFound(i64),
    #[error("Bootstrap failed while {stage}: {source}")]
    Bootstrap {
        stage: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("Invalid value for {var}: {reason}")]
    Config { var: &'static str, reason: String },
}

impl TodoError {
    pub fn status(&self) -> StatusCode {
        match self {
            TodoError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            TodoError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            TodoError::NotFound(_) => (status, self.to_string()).into_response(),
            _ => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %self, status = %status, "request failed");
                // 5xx bodies stay generic; the detail only goes to the log.
                let reason = status.canonical_reason().unwrap_or("Internal Server Error");
                (status, reason).into_response()
            }
        }
    }
}
