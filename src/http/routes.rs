//! HTTP route definitions

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::{AppState, VoteError};
use crate::chat::ChatMessage;
use crate::game::state::SessionMode;
use crate::game::votes::VoteChoice;
use crate::http::middleware::require_admin;
use crate::maps::{MapError, MapSummary};
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;
use crate::ws::protocol::Snapshot;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - `*` or a comma-separated origin list
    let cors = if state.config.client_origin.trim() == "*" {
        CorsLayer::new().allow_origin(Any)
    } else {
        let allowed_origins: Vec<header::HeaderValue> = state
            .config
            .client_origin
            .split(',')
            .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
            .collect();
        CorsLayer::new().allow_origin(allowed_origins)
    };
    let cors = cors
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/state", get(state_handler))
        .route("/maps", get(maps_handler))
        .route("/vote", post(vote_handler))
        .route("/ws", get(ws_handler));

    // Admin routes (bearer token when ADMIN_TOKEN is set)
    let admin_routes = Router::new()
        .route("/action", post(action_handler))
        .route("/start", post(start_handler))
        .route("/reset", post(reset_handler))
        .route("/maps/load", post(load_map_handler))
        .route("/chat", post(chat_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Read endpoints
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    spectators: usize,
    map_id: String,
    mode: SessionMode,
    turn: u64,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (map_id, mode, turn) = {
        let engine = state.engine.lock();
        let session = engine.state();
        (session.map_id.clone(), session.mode, session.turn_index + 1)
    };

    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        spectators: state.spectators.len(),
        map_id,
        mode,
        turn,
    })
}

async fn state_handler(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.snapshot())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapsResponse {
    current_map_id: String,
    maps: Vec<MapSummary>,
}

async fn maps_handler(State(state): State<AppState>) -> Json<MapsResponse> {
    let current_map_id = state.engine.lock().state().map_id.clone();
    Json(MapsResponse {
        current_map_id,
        maps: state.maps.list(),
    })
}

// ============================================================================
// Voting
// ============================================================================

#[derive(Deserialize)]
struct VoteRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    action: Option<String>,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<VoteChoice>,
}

async fn vote_handler(
    State(state): State<AppState>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(req) = body?;
    let action = state.cast_vote(
        req.name.as_deref().unwrap_or_default(),
        req.action.as_deref().unwrap_or_default(),
    )?;

    Ok(Json(OkResponse {
        ok: true,
        action: Some(action),
    }))
}

// ============================================================================
// Admin endpoints
// ============================================================================

#[derive(Deserialize)]
struct ActionRequest {
    action: String,
}

async fn action_handler(
    State(state): State<AppState>,
    body: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(req) = body?;
    let choice = VoteChoice::from_label(&req.action)
        .ok_or_else(|| AppError::BadRequest(format!("invalid action: {}", req.action)))?;
    state.queue_action(choice);

    Ok(Json(OkResponse {
        ok: true,
        action: Some(choice),
    }))
}

#[derive(Serialize)]
struct StartResponse {
    ok: bool,
    started: bool,
}

async fn start_handler(State(state): State<AppState>) -> Json<StartResponse> {
    Json(StartResponse {
        ok: true,
        started: state.start(),
    })
}

async fn reset_handler(State(state): State<AppState>) -> Json<OkResponse> {
    state.reset();
    Json(OkResponse {
        ok: true,
        action: None,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadMapRequest {
    map_id: String,
}

async fn load_map_handler(
    State(state): State<AppState>,
    body: Result<Json<LoadMapRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(req) = body?;
    state.load_map(&req.map_id)?;
    Ok(Json(OkResponse {
        ok: true,
        action: None,
    }))
}

#[derive(Serialize)]
struct ChatResponse {
    ok: bool,
    counted: bool,
}

async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<Vec<ChatMessage>>, JsonRejection>,
) -> Result<Json<Vec<ChatResponse>>, AppError> {
    let Json(messages) = body?;
    let results = messages
        .iter()
        .map(|message| ChatResponse {
            ok: true,
            counted: state.ingest_chat(message).is_some(),
        })
        .collect();
    Ok(Json(results))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<VoteError> for AppError {
    fn from(err: VoteError) -> Self {
        match err {
            VoteError::Missing | VoteError::InvalidAction(_) => AppError::BadRequest(err.to_string()),
            VoteError::NotVoting => AppError::Conflict(err.to_string()),
            VoteError::RateLimited => AppError::RateLimited,
        }
    }
}

impl From<MapError> for AppError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::UnknownMap(_) => AppError::NotFound(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
