use std::net::SocketAddr;

use anyhow::Result;
use app_metadata_api::{encode_results, ApiError, AppMetadataApi};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct ServiceState {
    api: AppMetadataApi,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    records: usize,
}

#[derive(Debug, Parser)]
#[command(name = "app-metadata-service")]
#[command(about = "In-memory HTTP registry for application metadata")]
struct Args {
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
    /// Largest accepted metadata document, in bytes.
    #[arg(long, default_value_t = 1024 * 1024)]
    max_body_bytes: usize,
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self { status, error: err.to_string() }
    }
}

fn app(state: ServiceState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metadata", post(metadata_create))
        .route("/metadata/search", get(metadata_search))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let state = ServiceState { api: AppMetadataApi::new() };
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, "app metadata service listening");
    axum::serve(listener, app(state, args.max_body_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn health(State(state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", records: state.api.record_count() })
}

async fn metadata_create(
    State(state): State<ServiceState>,
    body: Bytes,
) -> Result<StatusCode, ServiceError> {
    state.api.ingest(&body)?;
    Ok(StatusCode::CREATED)
}

async fn metadata_search(
    State(state): State<ServiceState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ServiceError> {
    let results = state.api.search(pairs)?;
    let body = encode_results(&results)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
