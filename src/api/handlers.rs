//! HTTP request handlers

use super::types::{
    ErrorResponse, HealthResponse, ResourceQuery, UssdCallback, UssdRequest, UssdResponse,
    WelcomeResponse,
};
use super::AppState;
use crate::db::{Resource, Translation};
use crate::runtime::{RuntimeError, TurnRequest};
use crate::state_machine::Screen;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/version", get(get_version))
        // Gateway callback
        .route("/ussd", post(ussd_callback))
        // JSON dialogue endpoint
        .route("/api/v1/ussd", post(ussd_json))
        // Catalog
        .route("/api/v1/resources", get(list_resources))
        .route("/api/v1/resources/:id", get(get_resource))
        .route("/api/v1/translations/:id", get(get_translation))
        .route(
            "/api/v1/translations/resource/:id",
            get(list_resource_translations),
        )
        .with_state(state)
}

// ============================================================
// Service info
// ============================================================

async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to African LMS API".to_string(),
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

async fn get_version() -> &'static str {
    concat!("ussd-lms ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// USSD
// ============================================================

async fn run_turn(state: &AppState, request: TurnRequest) -> Result<Screen, AppError> {
    if request.session_id.trim().is_empty() {
        return Err(AppError::BadRequest("sessionId is required".to_string()));
    }
    state.runtime.handle_turn(&request).await.map_err(|e| {
        tracing::error!(session_id = %request.session_id, error = %e, "USSD turn failed");
        AppError::from(e)
    })
}

/// Gateway callback; the body is the bare `CON`/`END` text
async fn ussd_callback(
    State(state): State<AppState>,
    Form(callback): Form<UssdCallback>,
) -> Result<String, AppError> {
    let screen = run_turn(
        &state,
        TurnRequest {
            phone_number: callback.phone_number,
            session_id: callback.session_id,
            text: callback.text,
        },
    )
    .await?;
    Ok(screen.to_string())
}

async fn ussd_json(
    State(state): State<AppState>,
    Json(req): Json<UssdRequest>,
) -> Result<Json<UssdResponse>, AppError> {
    let screen = run_turn(
        &state,
        TurnRequest {
            phone_number: req.phone_number,
            session_id: req.session_id,
            text: req.text,
        },
    )
    .await?;
    Ok(Json(UssdResponse {
        message: screen.to_string(),
        status: "200".to_string(),
    }))
}

// ============================================================
// Catalog
// ============================================================

async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> Result<Json<Vec<Resource>>, AppError> {
    let resources = state
        .db
        .list_approved(&query.filter(), query.offset(), query.page_size())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(resources))
}

async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Resource>, AppError> {
    let mut resource = state
        .db
        .get_approved_resource(id)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Resource not found".to_string()))?;

    match state.db.increment_view_count(id) {
        Ok(()) => resource.view_count += 1,
        Err(e) => tracing::warn!(resource_id = id, error = %e, "Failed to count view"),
    }
    Ok(Json(resource))
}

async fn list_resource_translations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Translation>>, AppError> {
    if state
        .db
        .get_approved_resource(id)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .is_none()
    {
        return Err(AppError::NotFound("Resource not found".to_string()));
    }
    let translations = state
        .db
        .list_translations(id)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(translations))
}

async fn get_translation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Translation>, AppError> {
    state
        .db
        .get_translation_by_id(id)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Translation not found".to_string()))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
