//! Repository selection and construction.
//!
//! The backend is taken from `REPOSITORY_TYPE` / `DATABASE_URL` when either
//! is set, otherwise from `repository.toml`, otherwise the in-memory store.

use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::{PostgresConfig, PostgresRepository};
use super::repository::{RepositoryError, RepositoryResult, RoutineRepository};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel implementation
    Postgres,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("postgres", "pg", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Backend requested by the environment, if any.
    ///
    /// `REPOSITORY_TYPE` wins; otherwise a database URL implies Postgres.
    /// An unknown `REPOSITORY_TYPE` falls back to local with a warning.
    pub fn from_env() -> Option<Self> {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return Some(val.parse().unwrap_or_else(|e| {
                log::warn!("{}; falling back to local repository", e);
                Self::Local
            }));
        }

        if std::env::var("DATABASE_URL").is_ok() || std::env::var("PG_DATABASE_URL").is_ok() {
            Some(Self::Postgres)
        } else {
            None
        }
    }
}

#[cfg(not(feature = "postgres-repo"))]
pub(super) fn postgres_disabled() -> RepositoryError {
    RepositoryError::configuration("Postgres repository feature not enabled")
}

/// A resolved backend, ready to be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySelection {
    Local,
    #[cfg(feature = "postgres-repo")]
    Postgres(PostgresConfig),
}

impl RepositorySelection {
    /// Pick the backend from the environment, then `file`, then local.
    pub fn resolve(file: Option<&RepositoryConfig>) -> RepositoryResult<Self> {
        match (RepositoryType::from_env(), file) {
            (Some(RepositoryType::Local), _) => Ok(Self::Local),
            (Some(RepositoryType::Postgres), _) => Self::postgres_from_env(),
            (None, Some(config)) => config.selection(),
            (None, None) => Ok(Self::Local),
        }
    }

    #[cfg(feature = "postgres-repo")]
    fn postgres_from_env() -> RepositoryResult<Self> {
        PostgresConfig::from_env()
            .map(Self::Postgres)
            .map_err(RepositoryError::configuration)
    }

    #[cfg(not(feature = "postgres-repo"))]
    fn postgres_from_env() -> RepositoryResult<Self> {
        Err(postgres_disabled())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Local => "local",
            #[cfg(feature = "postgres-repo")]
            Self::Postgres(_) => "postgres",
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```
/// use routine_rust::db::{RepositoryFactory, RepositorySelection};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let repo = rt
///     .block_on(RepositoryFactory::create(RepositorySelection::Local))
///     .unwrap();
/// assert!(rt.block_on(repo.health_check()).unwrap());
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Build the selected repository.
    pub async fn create(
        selection: RepositorySelection,
    ) -> RepositoryResult<Arc<dyn RoutineRepository>> {
        match selection {
            RepositorySelection::Local => Ok(Self::create_local()),
            #[cfg(feature = "postgres-repo")]
            RepositorySelection::Postgres(config) => {
                let pg = Self::create_postgres(&config).await?;
                Ok(pg as Arc<dyn RoutineRepository>)
            }
        }
    }

    /// Create a Postgres repository.
    ///
    /// Pool setup and migrations run on the blocking thread pool.
    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<PostgresRepository>> {
        let config = config.clone();
        let repo = tokio::task::spawn_blocking(move || PostgresRepository::new(config))
            .await
            .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))??;
        Ok(Arc::new(repo))
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> Arc<dyn RoutineRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Build the repository named by the environment or by `file`.
    pub async fn from_settings(
        file: Option<&RepositoryConfig>,
    ) -> RepositoryResult<Arc<dyn RoutineRepository>> {
        let selection = RepositorySelection::resolve(file)?;
        log::info!("Using {} repository", selection.name());
        Self::create(selection).await
    }
}
