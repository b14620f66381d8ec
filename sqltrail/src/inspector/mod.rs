//! HTTP inspector for retained scopes
//!
//! Two surfaces over the same cache:
//!
//! ```text
//! GET /              rendered HTML page (scopes newest first)
//! GET /raw           pretty JSON document
//! GET /static/{file} embedded stylesheet
//! ```
//!
//! [`raw_router`] exposes only the JSON document, at `/`.
//!
//! Rendering failures are logged and answered with a 500. They never touch
//! tracked state.

pub mod render;
pub mod view;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::{error, info};
use tokio::net::TcpListener;

use crate::domain::InspectorError;
use crate::profiler::Profiler;

pub use render::{raw_document, render_page};
pub use view::{OperationView, ScopeView};

/// Embedded static assets: (file name, content type, body).
const ASSETS: &[(&str, &str, &str)] =
    &[("style.css", "text/css; charset=utf-8", include_str!("../../static/style.css"))];

/// Page, raw document and static assets.
pub fn router(profiler: Profiler) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/raw", get(raw_handler))
        .route("/static/*file", get(static_handler))
        .with_state(profiler)
}

/// Raw document only, served at `/`.
pub fn raw_router(profiler: Profiler) -> Router {
    Router::new().route("/", get(raw_handler)).with_state(profiler)
}

/// Serve the full inspector on `addr` until the task is dropped.
///
/// Returns `Ok(())` immediately when tracking is disabled.
///
/// # Errors
/// Fails if the address cannot be bound or the server stops with an I/O
/// error.
pub async fn serve(profiler: Profiler, addr: &str) -> Result<(), InspectorError> {
    if !profiler.is_enabled() {
        return Ok(());
    }
    run(router(profiler), addr, "inspector").await
}

/// Serve only the raw document on `addr`.
///
/// # Errors
/// Same as [`serve`].
pub async fn serve_raw(profiler: Profiler, addr: &str) -> Result<(), InspectorError> {
    if !profiler.is_enabled() {
        return Ok(());
    }
    run(raw_router(profiler), addr, "raw inspector").await
}

async fn run(app: Router, addr: &str, what: &str) -> Result<(), InspectorError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| InspectorError::BindFailed { addr: addr.to_string(), source })?;
    info!("Serving {what} on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn page_handler(State(profiler): State<Profiler>) -> Response {
    match render_page(&profiler) {
        Ok(body) => ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response(),
        Err(err) => failure(&err),
    }
}

async fn raw_handler(State(profiler): State<Profiler>) -> Response {
    match raw_document(&profiler) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(err) => failure(&err),
    }
}

async fn static_handler(Path(file): Path<String>) -> Response {
    match ASSETS.iter().find(|(name, _, _)| *name == file) {
        Some((_, content_type, body)) => ([(header::CONTENT_TYPE, *content_type)], *body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn failure(err: &InspectorError) -> Response {
    error!("Inspector cannot serve request: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, "inspector error").into_response()
}
