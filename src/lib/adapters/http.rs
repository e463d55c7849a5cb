use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    Form, Router,
    extract::{FromRef, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tokio::net;

use crate::config::MissingTaskPolicy;
use crate::core::{TaskDescription, TodoError};
use crate::storage::{ConnectionManager, DbConn, tasks};
use crate::view;

#[cfg(feature = "tracing")]
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct AppState {
    pub connections: ConnectionManager,
    pub missing_task: MissingTaskPolicy,
}

impl AppState {
    pub fn new(connections: ConnectionManager, missing_task: MissingTaskPolicy) -> Self {
        Self {
            connections,
            missing_task,
        }
    }
}

impl FromRef<AppState> for ConnectionManager {
    fn from_ref(state: &AppState) -> Self {
        state.connections.clone()
    }
}

#[derive(Debug, Deserialize)]
pub struct AddTaskForm {
    pub task: Option<String>,
}

// Flask-style 302 rather than axum's 303 `Redirect::to`.
fn redirect_to_index() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

#[cfg_attr(feature = "tracing", instrument(skip_all))]
pub async fn list_tasks(mut conn: DbConn) -> Result<Html<String>, TodoError> {
    let tasks = tasks::list(&mut conn).await?;
    #[cfg(feature = "tracing")]
    debug!(count = tasks.len(), "Rendering task list");
    Ok(Html(view::render_index(&tasks)))
}

/// The connection is only acquired when there is something to insert.
#[cfg_attr(feature = "tracing", instrument(skip_all))]
pub async fn add_task(
    State(state): State<AppState>,
    Form(form): Form<AddTaskForm>,
) -> Result<Response, TodoError> {
    match form.task.as_deref().and_then(TaskDescription::parse) {
        Some(description) => {
            let mut conn = state.connections.acquire().await?;
            let _task = tasks::insert(&mut conn, &description).await?;
            #[cfg(feature = "tracing")]
            info!(id = _task.id, "Task added");
        }
        None => {
            #[cfg(feature = "tracing")]
            debug!("Empty task description, nothing added");
        }
    }
    Ok(redirect_to_index())
}

// `Path` is extracted before `DbConn`, so a malformed id is rejected with 400
// before any connection is taken.
#[cfg_attr(feature = "tracing", instrument(skip(state, conn)))]
pub async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut conn: DbConn,
) -> Result<Response, TodoError> {
    let found = tasks::complete(&mut conn, id).await?;
    if !found {
        #[cfg(feature = "tracing")]
        warn!(id, policy = ?state.missing_task, "Complete on unknown task");
    }
    state.missing_task.check(id, found)?;
    Ok(redirect_to_index())
}

#[cfg_attr(feature = "tracing", instrument(skip(state, conn)))]
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut conn: DbConn,
) -> Result<Response, TodoError> {
    let found = tasks::delete(&mut conn, id).await?;
    if !found {
        #[cfg(feature = "tracing")]
        warn!(id, policy = ?state.missing_task, "Delete on unknown task");
    }
    state.missing_task.check(id, found)?;
    Ok(redirect_to_index())
}

async fn health_route() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

pub fn router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(list_tasks))
        .route("/add", post(add_task))
        .route("/complete/{id}", get(complete_task))
        .route("/delete/{id}", get(delete_task))
        .route("/health", get(health_route))
        .with_state(state);

    #[cfg(feature = "tracing")]
    let router = router.layer(tower_http::trace::TraceLayer::new_for_http().make_span_with(
        |request: &axum::extract::Request<_>| {
            let uri = request.uri().to_string();
            tracing::info_span!("http_request", method = ?request.method(), uri)
        },
    ));

    router
}

pub struct HttpServer {
    router: Router,
    listener: net::TcpListener,
    connections: ConnectionManager,
}

impl HttpServer {
    pub async fn new(state: AppState, addr: SocketAddr) -> anyhow::Result<Self> {
        let connections = state.connections.clone();
        let listener = net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to listen on {}", addr))?;
        Ok(Self {
            router: router(state),
            listener,
            connections,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("listener has no local address")
    }

    /// Serves until Ctrl-C, then drains the connection pool.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    pub async fn run_until(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        #[cfg(feature = "tracing")]
        info!(addr = %self.local_addr()?, "Todo server listening");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("received error from running server")?;
        self.connections.close().await;
        #[cfg(feature = "tracing")]
        info!("Todo server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(_e) = tokio::signal::ctrl_c().await {
        #[cfg(feature = "tracing")]
        warn!(error = %_e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
