//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::{ServerConfig, DEFAULT_MAX_BODY_BYTES};
use crate::db::repository::RoutineRepository;
use crate::services::conflicts::TeacherMatching;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for routine storage
    pub repository: Arc<dyn RoutineRepository>,
    /// Teacher name comparison used by every conflict check
    pub matching: TeacherMatching,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create a new application state with the given repository and
    /// default settings.
    pub fn new(repository: Arc<dyn RoutineRepository>) -> Self {
        Self {
            repository,
            matching: TeacherMatching::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn from_config(repository: Arc<dyn RoutineRepository>, config: &ServerConfig) -> Self {
        Self {
            repository,
            matching: config.teacher_matching,
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn with_matching(mut self, matching: TeacherMatching) -> Self {
        self.matching = matching;
        self
    }
}
