//! Repository trait definitions for routine persistence.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`routine`]: Routine storage contract used by the conflict-checked save
//!
//! Implementations live in [`crate::db::repositories`]: an in-memory
//! `LocalRepository` and, behind the `postgres-repo` feature, a Diesel-backed
//! `PostgresRepository`.

pub mod error;
pub mod routine;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use routine::{RoutineRepository, SaveOutcome, SavedRoutine};
