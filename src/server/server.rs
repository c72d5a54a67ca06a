use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::extract::{Path as UrlPath, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::{header::CONTENT_TYPE, StatusCode};
use tracing::{debug, info};

use crate::config::settings::ServerConfig;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;

/// Shared state for the publication server: the directory the token record
/// lives in, plus the metrics registry.
#[derive(Clone)]
pub struct AppState {
    pub dir: PathBuf,
    pub metrics_state: MetricsState,
}

/// Router serving the token directory, with the metrics route merged in
/// when enabled. Split from [`start`] so tests can mount it on an ephemeral
/// port.
pub fn app(state: AppState, metrics_enabled: bool) -> Router {
    Router::new()
        .merge(state.metrics_state.router(metrics_enabled))
        .route("/{*path}", get(serve_file))
        .with_state(state)
}

/// Serves the token directory until process exit.
///
/// Deliberately ignorant of record semantics: a GET returns whatever bytes
/// the store most recently renamed into place, and refresh failures never
/// touch this task.
pub async fn start(config: &ServerConfig, dir: PathBuf) -> Result<()> {
    let metrics = get_metrics().await;
    let state = AppState {
        dir,
        metrics_state: MetricsState::new(metrics.registry.clone()),
    };
    let app = app(state, config.metrics_enabled);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("publication endpoint listening on {addr}");
    metrics.up.set(1);
    axum::serve(listener, app).await.context("publication endpoint")?;
    Ok(())
}

async fn serve_file(State(state): State<AppState>, UrlPath(path): UrlPath<String>) -> Response {
    let metrics = get_metrics().await;

    // scope is one directory: refuse anything that could climb out of it
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        metrics.publish_requests.with_label_values(&["404"]).inc();
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }

    let file = state.dir.join(&path);
    match tokio::fs::read(&file).await {
        Ok(body) => {
            metrics.publish_requests.with_label_values(&["200"]).inc();
            (
                StatusCode::OK,
                [(CONTENT_TYPE, content_type_for(&file))],
                body,
            )
                .into_response()
        }
        Err(err) => {
            debug!("publish: '{}' not served: {}", file.display(), err);
            metrics.publish_requests.with_label_values(&["404"]).inc();
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
