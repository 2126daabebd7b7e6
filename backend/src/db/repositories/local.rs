//! In-memory local repository implementation.
//!
//! Suitable for unit testing, local development and small single-school
//! deployments. Routines are kept in a `BTreeMap` keyed by (className,
//! section), which gives listing order for free.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::{RoutineId, RoutineKey};
use crate::db::checksum::routine_checksum;
use crate::db::repository::{
    ErrorContext, RepositoryError, RepositoryResult, RoutineRepository, SaveOutcome, SavedRoutine,
};
use crate::models::routine::{Routine, StoredRoutine};
use crate::services::conflicts::{check_routine, TeacherMatching};

/// In-memory local repository.
///
/// Conflict-checked saves hold the write lock across the read, the check
/// and the write, so concurrent saves are serialized.
///
/// # Example
/// ```
/// use routine_rust::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.routine_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    routines: BTreeMap<RoutineKey, StoredRoutine>,
    next_routine_id: i64,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            routines: BTreeMap::new(),
            next_routine_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn upsert(&mut self, routine: &Routine) -> SavedRoutine {
        let key = routine.key();
        let checksum = routine_checksum(routine);

        if let Some(existing) = self.routines.get_mut(&key) {
            let changed = existing.checksum != checksum;
            if changed {
                existing.routine = routine.clone();
                existing.checksum = checksum;
                existing.updated_at = Utc::now();
            }
            return SavedRoutine {
                routine: existing.clone(),
                changed,
            };
        }

        let id = RoutineId::new(self.next_routine_id);
        self.next_routine_id += 1;
        let stored = StoredRoutine {
            id,
            routine: routine.clone(),
            checksum,
            updated_at: Utc::now(),
        };
        self.routines.insert(key, stored.clone());
        SavedRoutine {
            routine: stored,
            changed: true,
        }
    }

    fn others(&self, exclude: &RoutineKey) -> Vec<&StoredRoutine> {
        self.routines
            .iter()
            .filter(|(key, _)| *key != exclude)
            .map(|(_, stored)| stored)
            .collect()
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of routines stored.
    pub fn routine_count(&self) -> usize {
        self.data.read().routines.len()
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(key: &RoutineKey, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Routine for class {} not found", key),
        ErrorContext::new(operation).with_routine(key),
    )
}

#[async_trait]
impl RoutineRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn list_routines(&self) -> RepositoryResult<Vec<StoredRoutine>> {
        self.check_health()?;
        Ok(self.data.read().routines.values().cloned().collect())
    }

    async fn get_routine(&self, key: &RoutineKey) -> RepositoryResult<StoredRoutine> {
        self.check_health()?;
        self.data
            .read()
            .routines
            .get(key)
            .cloned()
            .ok_or_else(|| missing(key, "get_routine"))
    }

    async fn list_other_routines(
        &self,
        exclude: &RoutineKey,
    ) -> RepositoryResult<Vec<StoredRoutine>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .others(exclude)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn upsert_routine(&self, routine: &Routine) -> RepositoryResult<SavedRoutine> {
        self.check_health()?;
        Ok(self.data.write().upsert(routine))
    }

    async fn delete_routine(&self, key: &RoutineKey) -> RepositoryResult<StoredRoutine> {
        self.check_health()?;
        self.data
            .write()
            .routines
            .remove(key)
            .ok_or_else(|| missing(key, "delete_routine"))
    }

    async fn save_routine_checked(
        &self,
        routine: &Routine,
        matching: TeacherMatching,
    ) -> RepositoryResult<SaveOutcome> {
        self.check_health()?;
        let key = routine.key();
        let mut data = self.data.write();

        let verdict = check_routine(routine, &data.others(&key), matching);
        match verdict {
            Err(conflict) => Ok(SaveOutcome::Rejected(conflict)),
            Ok(()) => Ok(SaveOutcome::Saved(data.upsert(routine))),
        }
    }
}
