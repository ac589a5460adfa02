use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::SchedulerConfig;
use crate::error::FixtureError;
use crate::fixture_service::FixtureService;
use crate::types::{DivisionId, MatchRecord, TeamId};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FixtureService>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub team_ids: Vec<TeamId>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
}

pub struct ApiError(FixtureError);

impl From<FixtureError> for ApiError {
    fn from(err: FixtureError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FixtureError::Scheduler(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FixtureError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[axum::debug_handler]
pub async fn config_handler(State(state): State<AppState>) -> Json<SchedulerConfig> {
    Json(state.service.config().clone())
}

#[axum::debug_handler]
pub async fn generate_handler(
    State(state): State<AppState>,
    Path(division_id): Path<DivisionId>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<Vec<MatchRecord>>), ApiError> {
    let records = state
        .service
        .generate_fixtures(division_id, &request.team_ids, request.start)
        .await?;
    Ok((StatusCode::CREATED, Json(records)))
}

#[axum::debug_handler]
pub async fn list_handler(
    State(state): State<AppState>,
    Path(division_id): Path<DivisionId>,
) -> Result<Json<Vec<MatchRecord>>, ApiError> {
    Ok(Json(state.service.fixtures_for_division(division_id).await?))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/config", get(config_handler))
        .route(
            "/divisions/{division_id}/fixtures",
            get(list_handler).post(generate_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Fixture API listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down fixture API");
        })
        .await
}
