pub mod cache;
pub mod canvas;
pub mod compositor;
pub mod config;
pub mod encoder;
pub mod error;
pub mod geocode;
pub mod ingest;
pub mod overpass;
pub mod pbf;
pub mod preview;
pub mod projection;
pub mod service;
pub mod session;
pub mod sizes;
pub mod style;
pub mod theme;
pub mod typography;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::{ApiError, PosterRequest, SizeSummary, ThemeSummary};
use tower_http::cors::{Any, CorsLayer};

use crate::canvas::CanvasError;
use crate::error::PosterError;
use crate::geocode::GeocodeError;
use crate::ingest::FetchError;
use crate::service::PosterService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PosterService>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/poster", post(poster_handler))
        .route("/api/themes", get(themes_handler))
        .route("/api/sizes", get(sizes_handler))
        .layer(cors)
        .with_state(state)
}

async fn poster_handler(
    State(state): State<AppState>,
    Json(req): Json<PosterRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let poster = state.service.render(&req).await.map_err(api_error)?;
    tracing::info!(
        "rendered {} ({}x{}, {} bytes)",
        poster.filename,
        poster.width,
        poster.height,
        poster.png.len()
    );
    Ok(Json(poster.to_response()))
}

async fn themes_handler() -> Json<Vec<ThemeSummary>> {
    let themes = theme::THEMES
        .iter()
        .map(|theme| ThemeSummary {
            key: theme.key.to_string(),
            name: theme.name.to_string(),
            description: theme.description.to_string(),
        })
        .collect();
    Json(themes)
}

async fn sizes_handler() -> Json<Vec<SizeSummary>> {
    let sizes = sizes::POSTER_SIZES
        .iter()
        .map(|size| SizeSummary {
            key: size.key.to_string(),
            label: size.label.to_string(),
            width: size.width,
            height: size.height,
        })
        .collect();
    Json(sizes)
}

pub fn status_for(err: &PosterError) -> StatusCode {
    match err {
        PosterError::MissingLocation | PosterError::Bounds(_) => StatusCode::BAD_REQUEST,
        PosterError::Fetch(FetchError::Bounds(_)) => StatusCode::BAD_REQUEST,
        PosterError::Canvas(CanvasError::Oversized { .. }) => StatusCode::BAD_REQUEST,
        PosterError::Geocode(GeocodeError::NotFound(_)) => StatusCode::NOT_FOUND,
        PosterError::Geocode(_) | PosterError::Fetch(_) => StatusCode::BAD_GATEWAY,
        PosterError::Canvas(_) | PosterError::Encode(_) | PosterError::Task(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn api_error(err: PosterError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("poster request failed: {err}");
    } else {
        tracing::warn!("poster request rejected: {err}");
    }
    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
