use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::core::{CreateTodo, DeletedTodo, HealthReport, Todo, TodoError, TodoPatch, TodoService};
use crate::storage::Storage;

#[cfg(feature = "tracing")]
use tower_http::trace::TraceLayer;
#[cfg(feature = "tracing")]
use tracing::info;

/// Builds the application router over `service`.
pub fn router<S: Storage + 'static>(service: TodoService<S>) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .route("/todos", get(list_todos::<S>).post(create_todo::<S>))
        .route(
            "/todos/{id}",
            get(get_todo::<S>).put(update_todo::<S>).delete(delete_todo::<S>),
        )
        .route("/health", get(health::<S>))
        .layer(CorsLayer::permissive())
        .with_state(service);

    #[cfg(feature = "tracing")]
    let router = router.layer(TraceLayer::new_for_http().make_span_with(
        |request: &axum::extract::Request<_>| {
            let uri = request.uri().to_string();
            tracing::info_span!("http_request", method = ?request.method(), uri)
        },
    ));

    router
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn bind<S: Storage + 'static>(
        service: TodoService<S>,
        addr: SocketAddr,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to listen on {addr}"))?;
        Ok(Self {
            router: router(service),
            listener,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until Ctrl-C or SIGTERM.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        #[cfg(feature = "tracing")]
        info!(addr = %self.local_addr()?, "HTTP server started");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    #[cfg(feature = "tracing")]
    info!("Shutdown signal received");
}

fn parse_id(raw: &str) -> Result<i32, TodoError> {
    raw.parse().map_err(|_| TodoError::InvalidId(raw.to_string()))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, TodoError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| {
            TodoError::Validation(format!("Invalid request body: {}", rejection.body_text()))
        })
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Todo API!",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /todos": "Get all todos",
            "GET /todos/:id": "Get a specific todo",
            "POST /todos": "Create a new todo",
            "PUT /todos/:id": "Update a todo",
            "DELETE /todos/:id": "Delete a todo",
            "GET /health": "Health check"
        }
    }))
}

async fn list_todos<S: Storage + 'static>(
    State(service): State<TodoService<S>>,
) -> Result<Json<Vec<Todo>>, TodoError> {
    Ok(Json(service.list().await?))
}

async fn get_todo<S: Storage + 'static>(
    State(service): State<TodoService<S>>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, TodoError> {
    Ok(Json(service.get(parse_id(&id)?).await?))
}

async fn create_todo<S: Storage + 'static>(
    State(service): State<TodoService<S>>,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), TodoError> {
    let todo = service.create(body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo<S: Storage + 'static>(
    State(service): State<TodoService<S>>,
    Path(id): Path<String>,
    payload: Result<Json<TodoPatch>, JsonRejection>,
) -> Result<Json<Todo>, TodoError> {
    let id = parse_id(&id)?;
    Ok(Json(service.update(id, body(payload)?).await?))
}

async fn delete_todo<S: Storage + 'static>(
    State(service): State<TodoService<S>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedTodo>, TodoError> {
    let todo = service.delete(parse_id(&id)?).await?;
    Ok(Json(todo.into()))
}

async fn health<S: Storage + 'static>(
    State(service): State<TodoService<S>>,
) -> (StatusCode, Json<HealthReport>) {
    let report = service.health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = ?report.error, "Health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
