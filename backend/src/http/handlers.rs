//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`services::routines`](crate::services::routines).

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    Json,
};

use super::dto::{
    AvailabilityQuery, AvailabilityReport, CheckRoutineResponse, DataResponse, HealthResponse,
    RoutineDraft, RoutineListResponse, SaveRoutineResponse, StoredRoutine,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::RoutineKey;
use crate::services::routines as routine_services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let healthy = routine_services::health_check(state.repository.as_ref()).await;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if healthy { "connected" } else { "disconnected" }.to_string(),
    }))
}

// =============================================================================
// Routine CRUD
// =============================================================================

/// GET /v1/routines
pub async fn list_routines(State(state): State<AppState>) -> HandlerResult<RoutineListResponse> {
    let routines = routine_services::list_routines(state.repository.as_ref()).await?;
    let total = routines.len();

    Ok(Json(RoutineListResponse {
        success: true,
        data: routines,
        total,
    }))
}

/// POST /v1/routines
///
/// Validate, check for teacher double-booking and store. A conflict is
/// answered with 400 and nothing is written.
pub async fn save_routine(
    State(state): State<AppState>,
    payload: Result<Json<RoutineDraft>, JsonRejection>,
) -> HandlerResult<SaveRoutineResponse> {
    let Json(draft) = payload?;
    let saved =
        routine_services::save_routine(state.repository.as_ref(), draft, state.matching).await?;

    Ok(Json(SaveRoutineResponse {
        success: true,
        data: saved.routine,
        changed: saved.changed,
    }))
}

/// POST /v1/routines/check
///
/// Report every conflict the routine would cause without storing it.
pub async fn check_routine(
    State(state): State<AppState>,
    payload: Result<Json<RoutineDraft>, JsonRejection>,
) -> HandlerResult<CheckRoutineResponse> {
    let Json(draft) = payload?;
    let conflicts =
        routine_services::check_routine_draft(state.repository.as_ref(), draft, state.matching)
            .await?;

    Ok(Json(CheckRoutineResponse {
        success: conflicts.is_empty(),
        conflicts: conflicts.into_iter().map(Into::into).collect(),
    }))
}

/// GET /v1/routines/{class_name}/{section}
pub async fn get_routine(
    State(state): State<AppState>,
    Path((class_name, section)): Path<(String, String)>,
) -> HandlerResult<DataResponse<StoredRoutine>> {
    let key = RoutineKey::new(class_name, section);
    let routine = routine_services::get_routine(state.repository.as_ref(), &key).await?;
    Ok(Json(DataResponse::ok(routine)))
}

/// DELETE /v1/routines/{class_name}/{section}
pub async fn delete_routine(
    State(state): State<AppState>,
    Path((class_name, section)): Path<(String, String)>,
) -> HandlerResult<DataResponse<StoredRoutine>> {
    let key = RoutineKey::new(class_name, section);
    let routine = routine_services::delete_routine(state.repository.as_ref(), &key).await?;
    Ok(Json(DataResponse::ok(routine)))
}

// =============================================================================
// Availability
// =============================================================================

/// GET /v1/availability?className=&section=&day=&startTime=&endTime=[&teacher=]
///
/// Advisory only; the save-time check stays authoritative.
pub async fn get_availability(
    State(state): State<AppState>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> HandlerResult<DataResponse<AvailabilityReport>> {
    let Query(query) = query?;
    let report =
        routine_services::teacher_availability(state.repository.as_ref(), query, state.matching)
            .await?;
    Ok(Json(DataResponse::ok(report)))
}
