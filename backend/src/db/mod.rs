//! Routine storage.
//!
//! Storage backends sit behind the [`RoutineRepository`] trait so they can
//! be swapped without touching the service or HTTP layers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer (http::handlers)                            │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service layer (services::routines)                     │
//! │  - Draft validation                                     │
//! │  - Conflict-checked saves                               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository trait (repository::routine)                 │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │                              │
//! ┌───▼──────────────┐   ┌───────────▼──────────┐
//! │ LocalRepository  │   │ PostgresRepository   │
//! │ (in-memory)      │   │ (Diesel, r2d2)       │
//! └──────────────────┘   └──────────────────────┘
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use checksum::{calculate_checksum, routine_checksum};
pub use factory::{RepositoryFactory, RepositorySelection, RepositoryType};
pub use repo_config::{ConflictSettings, RepositoryConfig};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::{PostgresConfig, PostgresRepository};
pub use repository::{
    ErrorContext, RepositoryError, RepositoryResult, RoutineRepository, SaveOutcome, SavedRoutine,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn RoutineRepository>> = OnceLock::new();

/// Initialize the global repository singleton.
///
/// `REPOSITORY_TYPE` / `DATABASE_URL` take precedence over
/// `repository.toml`; with neither the in-memory store is used. A
/// `repository.toml` that exists but does not parse is an error. Calling it
/// again after a successful initialization is a no-op.
pub async fn init_repository() -> Result<&'static Arc<dyn RoutineRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo);
    }

    let file = RepositoryConfig::discover().context("Failed to load repository.toml")?;
    let repo = RepositoryFactory::from_settings(file.as_ref())
        .await
        .context("Failed to initialize routine repository")?;
    Ok(REPOSITORY.get_or_init(|| repo))
}
