//! Public API surface for the routine backend.
//!
//! This file consolidates identifiers and the domain types exposed over HTTP.
//! All types derive Serialize/Deserialize for JSON serialization.

pub use crate::models::draft::{
    DayScheduleDraft, FieldIssue, PeriodDraft, RoutineDraft, ValidationError,
};
pub use crate::models::routine::{
    DaySchedule, Period, Routine, StoredRoutine, Weekday, TIFFIN_SUBJECT,
};
pub use crate::models::time::{TimeOfDay, TimeRange};
pub use crate::services::availability::BusyTeacher;
pub use crate::services::conflicts::{ConflictError, TeacherMatching};

use serde::{Deserialize, Serialize};

/// Routine identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutineId(pub i64);

impl RoutineId {
    pub fn new(value: i64) -> Self {
        RoutineId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RoutineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RoutineId> for i64 {
    fn from(id: RoutineId) -> Self {
        id.0
    }
}

/// Natural key of a routine: one document per (className, section).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineKey {
    pub class_name: String,
    pub section: String,
}

impl RoutineKey {
    pub fn new(class_name: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            section: section.into(),
        }
    }
}

impl std::fmt::Display for RoutineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.class_name, self.section)
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
