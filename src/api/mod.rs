//! JSON API driving the pipeline for a single-page frontend

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::SkiScoutError;
use crate::export;
use crate::models::{BookingOptions, DateRange};
use crate::pipeline::{ScoutPipeline, ScoutReport, SearchRequest};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ScoutPipeline>,
    pub default_radius_miles: u32,
}

/// Query string shared by both endpoints
#[derive(Debug, Deserialize)]
pub struct ResortQuery {
    pub location: String,
    pub radius_miles: Option<u32>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    #[serde(default)]
    pub lessons: bool,
    #[serde(default)]
    pub rental: bool,
}

impl ResortQuery {
    fn into_request(self, default_radius_miles: u32) -> crate::Result<SearchRequest> {
        let dates =
            DateRange::parse_or_default(self.date_from.as_deref(), self.date_to.as_deref())?;
        SearchRequest::new(
            self.location,
            self.radius_miles.unwrap_or(default_radius_miles),
            dates,
            BookingOptions {
                lessons: self.lessons,
                rental: self.rental,
            },
        )
    }
}

pub struct ApiError(SkiScoutError);

impl From<SkiScoutError> for ApiError {
    fn from(err: SkiScoutError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SkiScoutError::Validation { .. } => StatusCode::BAD_REQUEST,
            SkiScoutError::LocationNotFound { .. } => StatusCode::NOT_FOUND,
            _ => {
                warn!("Request failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/resorts", get(get_resorts))
        .route("/export", get(get_export))
        .with_state(state)
}

async fn scout(state: &AppState, query: ResortQuery) -> Result<ScoutReport, ApiError> {
    let request = query.into_request(state.default_radius_miles)?;
    Ok(state.pipeline.run(&request).await?)
}

async fn get_resorts(
    State(state): State<AppState>,
    Query(query): Query<ResortQuery>,
) -> Result<Json<ScoutReport>, ApiError> {
    Ok(Json(scout(&state, query).await?))
}

async fn get_export(
    State(state): State<AppState>,
    Query(query): Query<ResortQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = scout(&state, query).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        export::export_links(&report.resorts),
    ))
}
