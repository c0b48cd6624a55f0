//! Control endpoint.
//!
//! A small axum router on its own tokio task.  Handlers only flip
//! [`ControlFlags`](crate::app::shared::ControlFlags) through the shared
//! lock; they never touch sensors or outputs.
//!
//! Endpoints:
//! - GET  /health - `{running, active}`
//! - POST /wake   - `system_active = true`
//! - POST /sleep  - `system_active = false`
//! - POST /quit   - `shutdown_requested = true`
//! - anything else - 404 `{"error": "not found"}`

use std::future::Future;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::info;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::app::commands::ControlCommand;
use crate::app::shared::SharedContext;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub running: bool,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct ActiveResponse {
    pub ok: bool,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct QuitResponse {
    pub ok: bool,
    pub quitting: bool,
}

/// Build the control router over `shared`.
pub fn router(shared: SharedContext) -> Router {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/wake", post(wake).fallback(not_found))
        .route("/sleep", post(sleep).fallback(not_found))
        .route("/quit", post(quit).fallback(not_found))
        .fallback(not_found)
        .with_state(shared)
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("CONTROL | listening on {}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health(State(shared): State<SharedContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        running: true,
        active: shared.is_active(),
    })
}

async fn wake(State(shared): State<SharedContext>) -> Json<ActiveResponse> {
    let flags = shared.apply_command(ControlCommand::Wake);
    Json(ActiveResponse {
        ok: true,
        active: flags.system_active,
    })
}

async fn sleep(State(shared): State<SharedContext>) -> Json<ActiveResponse> {
    let flags = shared.apply_command(ControlCommand::Sleep);
    Json(ActiveResponse {
        ok: true,
        active: flags.system_active,
    })
}

async fn quit(State(shared): State<SharedContext>) -> Json<QuitResponse> {
    let flags = shared.apply_command(ControlCommand::Quit);
    Json(QuitResponse {
        ok: true,
        quitting: flags.shutdown_requested,
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}
