use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::routines;
use crate::api::RoutineId;
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::routine::{Routine, StoredRoutine};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = routines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoutineRow {
    pub routine_id: i64,
    pub class_name: String,
    pub section: String,
    pub week_schedule_json: Value,
    pub checksum: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = routines)]
pub struct NewRoutineRow {
    pub class_name: String,
    pub section: String,
    pub week_schedule_json: Value,
    pub checksum: String,
    pub updated_at: DateTime<Utc>,
}

impl RoutineRow {
    pub fn into_stored(self) -> RepositoryResult<StoredRoutine> {
        let week_schedule = serde_json::from_value(self.week_schedule_json).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Failed to parse week_schedule_json: {e}"),
                ErrorContext::new("decode_routine")
                    .with_routine(format!("{}-{}", self.class_name, self.section)),
            )
        })?;
        Ok(StoredRoutine {
            id: RoutineId::new(self.routine_id),
            routine: Routine {
                class_name: self.class_name,
                section: self.section,
                week_schedule,
            },
            checksum: self.checksum,
            updated_at: self.updated_at,
        })
    }
}

impl NewRoutineRow {
    pub fn from_routine(routine: &Routine, checksum: String) -> RepositoryResult<Self> {
        let week_schedule_json = serde_json::to_value(&routine.week_schedule).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Failed to encode week schedule: {e}"),
                ErrorContext::new("encode_routine").with_routine(routine.key()),
            )
        })?;
        Ok(Self {
            class_name: routine.class_name.clone(),
            section: routine.section.clone(),
            week_schedule_json,
            checksum,
            updated_at: Utc::now(),
        })
    }
}
