//! Routine persistence orchestration.
//!
//! Every write goes through [`save_routine`]: the draft is validated, then
//! the repository runs the conflict check and the upsert as one step.

use serde::{Deserialize, Serialize};

use super::availability::{busy_teachers, is_teacher_available, BusyTeacher};
use super::conflicts::{check_routine_report, ConflictError, TeacherMatching};
use crate::api::RoutineKey;
use crate::db::repository::{RepositoryError, RoutineRepository, SaveOutcome, SavedRoutine};
use crate::models::draft::{FieldIssue, RoutineDraft, ValidationError};
use crate::models::routine::{StoredRoutine, Weekday};
use crate::models::time::{TimeOfDay, TimeRange};

/// Failure of a routine operation.
#[derive(Debug, thiserror::Error)]
pub enum RoutineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type RoutineResult<T> = Result<T, RoutineError>;

/// Validate `draft` and store it unless a teacher would be double-booked.
///
/// A rejected routine leaves storage untouched.
pub async fn save_routine<R: RoutineRepository + ?Sized>(
    repo: &R,
    draft: RoutineDraft,
    matching: TeacherMatching,
) -> RoutineResult<SavedRoutine> {
    let routine = draft.validate()?;
    let key = routine.key();

    match repo.save_routine_checked(&routine, matching).await? {
        SaveOutcome::Saved(saved) => {
            log::info!(
                "Saved routine {} ({} periods, changed={})",
                key,
                routine.period_count(),
                saved.changed
            );
            Ok(saved)
        }
        SaveOutcome::Rejected(conflict) => {
            log::warn!("Rejected routine {}: {}", key, conflict);
            Err(conflict.into())
        }
    }
}

/// Validate `draft` and report every conflict it would cause. Never writes.
pub async fn check_routine_draft<R: RoutineRepository + ?Sized>(
    repo: &R,
    draft: RoutineDraft,
    matching: TeacherMatching,
) -> RoutineResult<Vec<ConflictError>> {
    let routine = draft.validate()?;
    let others = repo.list_other_routines(&routine.key()).await?;
    let conflicts = check_routine_report(&routine, &others, matching);
    log::debug!(
        "Dry run for {} found {} conflict(s)",
        routine.key(),
        conflicts.len()
    );
    Ok(conflicts)
}

pub async fn list_routines<R: RoutineRepository + ?Sized>(
    repo: &R,
) -> RoutineResult<Vec<StoredRoutine>> {
    Ok(repo.list_routines().await?)
}

pub async fn get_routine<R: RoutineRepository + ?Sized>(
    repo: &R,
    key: &RoutineKey,
) -> RoutineResult<StoredRoutine> {
    Ok(repo.get_routine(key).await?)
}

pub async fn delete_routine<R: RoutineRepository + ?Sized>(
    repo: &R,
    key: &RoutineKey,
) -> RoutineResult<StoredRoutine> {
    let deleted = repo.delete_routine(key).await?;
    log::info!("Deleted routine {}", key);
    Ok(deleted)
}

/// True when the repository answers.
pub async fn health_check<R: RoutineRepository + ?Sized>(repo: &R) -> bool {
    match repo.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            log::warn!("Repository health check failed: {}", e);
            false
        }
    }
}

/// Slot to preview, as received from a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailabilityQuery {
    pub class_name: String,
    pub section: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    /// When given, the report also says whether this teacher is free.
    pub teacher: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub busy: Vec<BusyTeacher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

struct ParsedQuery {
    editing: RoutineKey,
    day: Weekday,
    slot: TimeRange,
    teacher: Option<String>,
}

impl AvailabilityQuery {
    fn parse(self) -> Result<ParsedQuery, ValidationError> {
        let mut issues = Vec::new();
        let mut issue = |field: &str, message: String| {
            issues.push(FieldIssue {
                field: field.to_string(),
                message,
            })
        };

        let day = self
            .day
            .parse::<Weekday>()
            .map_err(|e| issue("day", e))
            .ok();
        let start = self
            .start_time
            .parse::<TimeOfDay>()
            .map_err(|e| issue("startTime", e.to_string()))
            .ok();
        let end = self
            .end_time
            .parse::<TimeOfDay>()
            .map_err(|e| issue("endTime", e.to_string()))
            .ok();
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                issue("endTime", "must be after startTime".to_string());
            }
        }

        match (day, start, end) {
            (Some(day), Some(start), Some(end)) if issues.is_empty() => Ok(ParsedQuery {
                editing: RoutineKey::new(self.class_name.trim(), self.section.trim()),
                day,
                slot: TimeRange::new(start, end),
                teacher: self
                    .teacher
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
            }),
            _ => Err(ValidationError { issues }),
        }
    }
}

/// Teachers already busy during the queried slot in routines other than
/// the one being edited.
pub async fn teacher_availability<R: RoutineRepository + ?Sized>(
    repo: &R,
    query: AvailabilityQuery,
    matching: TeacherMatching,
) -> RoutineResult<AvailabilityReport> {
    let query = query.parse()?;
    let others = repo.list_other_routines(&query.editing).await?;
    let busy = busy_teachers(&others, &query.editing, query.day, query.slot);
    let available = query.teacher.as_deref().map(|teacher| {
        is_teacher_available(
            &others,
            &query.editing,
            query.day,
            query.slot,
            teacher,
            matching,
        )
    });

    Ok(AvailabilityReport {
        day: query.day,
        start_time: query.slot.start,
        end_time: query.slot.end,
        busy,
        teacher: query.teacher,
        available,
    })
}
