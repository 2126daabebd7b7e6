//! Routine repository trait.
//!
//! Storage holds one routine per (className, section). Saves replace the
//! whole weekly structure; there is no per-period update.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RepositoryResult;
use crate::api::RoutineKey;
use crate::models::routine::{Routine, StoredRoutine};
use crate::services::conflicts::{check_routine, ConflictError, TeacherMatching};

/// Result of a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRoutine {
    pub routine: StoredRoutine,
    /// False when the stored weekly schedule was already identical.
    pub changed: bool,
}

/// Result of a conflict-checked save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(SavedRoutine),
    /// Nothing was written.
    Rejected(ConflictError),
}

/// Repository trait for routine persistence.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait RoutineRepository: Send + Sync {
    /// Check if the storage backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// All stored routines ordered by (className, section).
    async fn list_routines(&self) -> RepositoryResult<Vec<StoredRoutine>>;

    /// Fetch one routine.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no routine is stored for `key`
    async fn get_routine(&self, key: &RoutineKey) -> RepositoryResult<StoredRoutine>;

    /// Every stored routine except the one identified by `exclude`.
    async fn list_other_routines(&self, exclude: &RoutineKey)
        -> RepositoryResult<Vec<StoredRoutine>>;

    /// Insert or replace the routine for its (className, section) key.
    ///
    /// No conflict check is performed.
    async fn upsert_routine(&self, routine: &Routine) -> RepositoryResult<SavedRoutine>;

    /// Delete one routine, returning what was stored.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no routine is stored for `key`
    async fn delete_routine(&self, key: &RoutineKey) -> RepositoryResult<StoredRoutine>;

    /// Check `routine` against every other stored routine and upsert it if
    /// no teacher would be double-booked.
    ///
    /// The default implementation reads, checks and writes in three separate
    /// steps, so two concurrent saves can each pass and together create a
    /// conflict. Backends able to do better override it to run the whole
    /// sequence atomically.
    async fn save_routine_checked(
        &self,
        routine: &Routine,
        matching: TeacherMatching,
    ) -> RepositoryResult<SaveOutcome> {
        let others = self.list_other_routines(&routine.key()).await?;
        if let Err(conflict) = check_routine(routine, &others, matching) {
            return Ok(SaveOutcome::Rejected(conflict));
        }
        Ok(SaveOutcome::Saved(self.upsert_routine(routine).await?))
    }
}
