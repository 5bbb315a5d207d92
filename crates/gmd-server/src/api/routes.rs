//! REST API routes.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::ws;
use crate::persistence::launches::{self as launches_db, LaunchRecord};
use crate::state::{AppState, StreamEvent};
use gmd_core::models::{
    InterceptorSite, LaunchRequest, Missile, MissileClass, MissileStatus,
};
use gmd_core::{GeoPoint, InterceptOutcome};

const DEFAULT_LAUNCH_LIST_LIMIT: u32 = 50;
const MAX_LAUNCH_LIST_LIMIT: u32 = 500;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api", get(root))
        .route("/api/", get(root))
        .route("/api/missiles", get(list_missiles))
        .route("/api/missiles/launch", post(launch_missile))
        .route("/api/missiles/:missile_id", get(get_missile))
        .route("/api/interceptors", get(list_interceptor_sites))
        .route("/api/intercept/:missile_id", post(intercept_missile))
        .route("/api/simulate/mass-attack", post(simulate_mass_attack))
        .route("/api/launches", get(list_launches))
        .route("/health", get(health))
        // WebSocket streaming
        .route("/ws", get(ws::ws_handler))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "GMDCSS - Global Missile Defense Command & Simulation System"
    }))
}

#[derive(Debug, Serialize)]
pub struct LaunchResponse {
    pub message: String,
    pub missile_id: String,
}

/// Launch a missile.
/// POST /api/missiles/launch
async fn launch_missile(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LaunchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LaunchResponse>), ApiError> {
    let Json(request) = payload?;
    let missile = launch(&state, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(LaunchResponse {
            message: "Missile launched".to_string(),
            missile_id: missile.id,
        }),
    ))
}

async fn launch(state: &AppState, request: LaunchRequest) -> Result<Missile, ApiError> {
    let missile = state.launch(request)?;
    tracing::info!(
        "Launched {} {} ({}) from {:.4}, {:.4} toward {:.4}, {:.4}",
        missile.class,
        missile.name,
        missile.id,
        missile.launch.lat,
        missile.launch.lon,
        missile.target.lat,
        missile.target.lon
    );
    state.record_launch(&missile).await;
    Ok(missile)
}

/// GET /api/missiles
async fn list_missiles(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "missiles": state.get_all_missiles() }))
}

/// GET /api/missiles/:missile_id
async fn get_missile(
    State(state): State<Arc<AppState>>,
    Path(missile_id): Path<String>,
) -> Result<Json<Missile>, ApiError> {
    state
        .get_missile(&missile_id)
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("missile {missile_id} not found")))
}

#[derive(Debug, Serialize)]
struct SitesResponse {
    interceptor_sites: Vec<InterceptorSite>,
}

/// GET /api/interceptors
async fn list_interceptor_sites(State(state): State<Arc<AppState>>) -> Json<SitesResponse> {
    Json(SitesResponse {
        interceptor_sites: state.get_interceptor_sites(),
    })
}

#[derive(Debug, Deserialize)]
pub struct InterceptQuery {
    pub interceptor_site_id: String,
}

#[derive(Debug, Serialize)]
pub struct InterceptResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: InterceptOutcome,
}

/// Issue an intercept against an Active missile.
/// POST /api/intercept/:missile_id?interceptor_site_id=...
async fn intercept_missile(
    State(state): State<Arc<AppState>>,
    Path(missile_id): Path<String>,
    query: Result<Query<InterceptQuery>, QueryRejection>,
) -> Result<Json<InterceptResponse>, ApiError> {
    let Query(query) = query?;
    let outcome = state.intercept(&missile_id, &query.interceptor_site_id)?;

    tracing::info!(
        "Missile {} intercepted by site {} (interceptor expended: {})",
        missile_id,
        outcome.interceptor_site_id,
        outcome.interceptor_expended
    );

    state.publish(&StreamEvent::intercept(&outcome, Utc::now()));
    state.record_status(&missile_id, MissileStatus::Intercepted);

    Ok(Json(InterceptResponse {
        message: format!("Intercept command issued for missile {missile_id}"),
        outcome,
    }))
}

/// Coordinated demonstration attack. Each scenario launches the class its name
/// implies rather than a random one, so repeated runs are comparable.
fn mass_attack_scenarios() -> Vec<LaunchRequest> {
    vec![
        // Pyongyang -> San Francisco
        LaunchRequest::new(
            "ICBM-Alpha",
            MissileClass::Icbm,
            GeoPoint::new(39.0458, 125.7625),
            GeoPoint::new(37.5665, -122.4194),
        ),
        // Tokyo -> Los Angeles
        LaunchRequest::new(
            "IRBM-Beta",
            MissileClass::Irbm,
            GeoPoint::new(35.6762, 139.6503),
            GeoPoint::new(34.0522, -118.2437),
        ),
        // Moscow -> New York
        LaunchRequest::new(
            "Hypersonic-Gamma",
            MissileClass::Hypersonic,
            GeoPoint::new(55.7558, 37.6173),
            GeoPoint::new(40.7128, -74.0060),
        ),
        // Shanghai -> Seattle
        LaunchRequest::new(
            "SRBM-Delta",
            MissileClass::Srbm,
            GeoPoint::new(31.2304, 121.4737),
            GeoPoint::new(47.6062, -122.3321),
        ),
    ]
}

/// POST /api/simulate/mass-attack
///
/// Classes are fixed per scenario, see `mass_attack_scenarios`.
async fn simulate_mass_attack(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let mut launched = Vec::new();
    for request in mass_attack_scenarios() {
        launched.push(launch(&state, request).await?.id);
    }

    tracing::warn!("Mass attack simulation launched {} missiles", launched.len());

    Ok(Json(json!({
        "message": "Mass attack simulation initiated",
        "missiles": launched,
    })))
}

#[derive(Debug, Deserialize)]
pub struct LaunchListQuery {
    pub limit: Option<u32>,
}

/// Launch log, newest first.
/// GET /api/launches?limit=50
async fn list_launches(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LaunchListQuery>, QueryRejection>,
) -> Result<Json<Vec<LaunchRecord>>, ApiError> {
    let Query(query) = query?;
    let db = state.database().ok_or_else(|| {
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "launch log is disabled")
    })?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LAUNCH_LIST_LIMIT)
        .clamp(1, MAX_LAUNCH_LIST_LIMIT);

    launches_db::list_launches(db.pool(), limit)
        .await
        .map(Json)
        .map_err(|err| {
            tracing::error!("Failed to read launch log: {}", err);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to read launch log")
        })
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let now = Utc::now();
    Json(json!({
        "status": "ok",
        "uptime_s": (now - state.started_at()).num_seconds(),
        "active_missiles": state.active_missile_count(),
        "subscribers": state.subscriber_count(),
        "persistence": state.database().is_some(),
        "loops": state.loop_heartbeats(),
    }))
}
