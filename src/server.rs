//! HTTP surface: `POST /sign` and `GET /health`.
//!
//! The body of `/sign` is the binary request format from [`crate::wire`];
//! the response is the stamped PDF. Failures map through
//! [`StampError::status_code`] and carry the error message as plain text.
//!
//! ## Middleware (outermost first)
//!
//! 1. `Trace`:     one span per request with method, path, status, latency
//! 2. `Timeout`:   whole-request deadline, answered with `408`
//! 3. `BodyLimit`: bodies above `max_body_bytes` are refused with `413`

use crate::config::{StampConfig, StampStyle};
use crate::engine::DocumentEngine;
use crate::error::StampError;
use crate::stamp::stamp_body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// State shared by every handler.
pub struct AppState<E> {
    pub engine: Arc<E>,
    pub style: Arc<StampStyle>,
}

// Manual impl: `E` itself need not be `Clone`.
impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            style: Arc::clone(&self.style),
        }
    }
}

/// Assemble the router with all routes and middleware.
pub fn build_router<E>(engine: Arc<E>, config: &StampConfig) -> Router
where
    E: DocumentEngine + 'static,
{
    let state = AppState {
        engine,
        style: Arc::new(config.style.clone()),
    };

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    Router::new()
        .route("/sign", post(sign_handler::<E>))
        .route("/health", get(health_handler::<E>))
        .layer(layers)
        .with_state(state)
}

/// Bind the configured address. Port `0` picks a free port.
pub async fn bind(config: &StampConfig) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Serve `router` on `listener` until `shutdown` resolves.
///
/// In-flight requests are allowed to finish after the signal.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn sign_handler<E>(
    State(state): State<AppState<E>>,
    body: Bytes,
) -> Result<Response, StampError>
where
    E: DocumentEngine + 'static,
{
    let stamped = stamp_body(state.engine, body, &state.style).await?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], stamped).into_response())
}

async fn health_handler<E>(State(state): State<AppState<E>>) -> Json<serde_json::Value>
where
    E: DocumentEngine + 'static,
{
    let fonts: Vec<&str> = state.engine.fonts().names().collect();
    Json(json!({
        "status": "ok",
        "engine": state.engine.name(),
        "fonts": fonts,
    }))
}

impl IntoResponse for StampError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("Stamp request failed: {}", self);
        } else {
            warn!("Stamp request rejected ({}): {}", status.as_u16(), self);
        }
        (status, self.to_string()).into_response()
    }
}
