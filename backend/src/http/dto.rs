//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies reuse the model drafts directly; only the response
//! envelopes live here.

use serde::{Deserialize, Serialize};

pub use crate::models::draft::RoutineDraft;
pub use crate::models::routine::StoredRoutine;
pub use crate::services::conflicts::ConflictError;
pub use crate::services::routines::{AvailabilityQuery, AvailabilityReport};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Envelope for a single payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Response for `GET /v1/routines`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineListResponse {
    pub success: bool,
    pub data: Vec<StoredRoutine>,
    pub total: usize,
}

/// Response for a successful save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRoutineResponse {
    pub success: bool,
    pub data: StoredRoutine,
    /// False when the stored schedule was already identical.
    pub changed: bool,
}

/// One conflict with its rendered message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictView {
    pub message: String,
    #[serde(flatten)]
    pub conflict: ConflictError,
}

impl From<ConflictError> for ConflictView {
    fn from(conflict: ConflictError) -> Self {
        Self {
            message: conflict.to_string(),
            conflict,
        }
    }
}

/// Response for the dry-run check. `success` is true when nothing conflicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRoutineResponse {
    pub success: bool,
    pub conflicts: Vec<ConflictView>,
}
