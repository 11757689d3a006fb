mod config;
mod error;
mod models;
mod services;
#[cfg(test)]
mod test_support;
mod utils;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
};
use http::{HeaderName, HeaderValue, Method, header};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{ChapterRequest, ChapterResult};
use crate::services::story::{self, Providers};
use crate::utils::response::{SuccessBody, success};

#[derive(Clone)]
struct AppState {
    providers: Arc<Providers>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let app_state = AppState {
        providers: Arc::new(Providers::from_config(&config)?),
    };
    let app = app(app_state, &config.allowed_origins);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn app(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]);

    Router::new()
        .route("/health", get(health_check))
        .route("/ai/generate", post(generate_chapter))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache, no-store, must-revalidate"),
                ))
                .layer(middleware::from_fn(utils::request_log::log_request)),
        )
}

async fn health_check() -> &'static str {
    "OK"
}

#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
async fn generate_chapter(
    State(state): State<AppState>,
    payload: Result<Json<ChapterRequest>, JsonRejection>,
) -> Result<Json<SuccessBody<ChapterResult>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "rejected chapter request body");
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid chapter request.")
    })?;

    info!(chapter = request.chapter_number(), "generating chapter");
    let chapter = story::process_request(&request, &state.providers).await?;

    Ok(success(chapter))
}
