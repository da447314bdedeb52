use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, AppState};
use crate::pipeline::ScoutPipeline;
use crate::{Result, SkiScoutError};

pub fn app(pipeline: Arc<ScoutPipeline>, default_radius_miles: u32) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest(
            "/api",
            api::router(AppState {
                pipeline,
                default_radius_miles,
            }),
        )
        .layer(cors)
}

pub async fn run(pipeline: Arc<ScoutPipeline>, default_radius_miles: u32, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server running at http://localhost:{}", port);
    axum::serve(listener, app(pipeline, default_radius_miles))
        .await
        .map_err(|e| SkiScoutError::general(format!("Web server stopped: {e}")))
}
