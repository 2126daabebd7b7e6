//! `repository.toml` support.
//!
//! ```toml
//! [repository]
//! type = "postgres"
//!
//! [postgres]
//! database_url = "postgres://routines@localhost/routines"
//!
//! [conflicts]
//! teacher_matching = "normalized"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[cfg(not(feature = "postgres-repo"))]
use super::factory::postgres_disabled;
use super::factory::{RepositorySelection, RepositoryType};
use super::repository::RepositoryError;
#[cfg(feature = "postgres-repo")]
use crate::db::PostgresConfig;
use crate::services::conflicts::TeacherMatching;

/// Names an explicit configuration file, bypassing the search.
pub const CONFIG_PATH_VAR: &str = "REPOSITORY_CONFIG";

const SEARCH_PATHS: [&str; 3] = [
    "repository.toml",
    "backend/repository.toml",
    "../repository.toml",
];

/// Parsed `repository.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub postgres: PostgresSettings,
    #[serde(default)]
    pub conflicts: ConflictSettings,
}

/// Conflict detection settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConflictSettings {
    /// How teacher names are compared across routines.
    #[serde(default)]
    pub teacher_matching: TeacherMatching,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: "local".to_string(),
        }
    }
}

/// Postgres connection settings. Durations are in seconds unless suffixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: u64,
    pub idle_timeout: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: 30,
            idle_timeout: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl RepositoryConfig {
    /// Load and parse a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Find and load `repository.toml`.
    ///
    /// `REPOSITORY_CONFIG` names the file explicitly; otherwise the current
    /// directory, `backend/` and the parent directory are searched.
    /// `Ok(None)` means there is no file. A file that exists but cannot be
    /// read or parsed is an error.
    pub fn discover() -> Result<Option<Self>, RepositoryError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            return Self::from_file(path).map(Some);
        }

        SEARCH_PATHS
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Self::from_file)
            .transpose()
    }

    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }

    /// The backend this file asks for.
    pub fn selection(&self) -> Result<RepositorySelection, RepositoryError> {
        let repo_type = self.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;

        match repo_type {
            RepositoryType::Local => Ok(RepositorySelection::Local),
            RepositoryType::Postgres => self.postgres_selection(),
        }
    }

    #[cfg(feature = "postgres-repo")]
    fn postgres_selection(&self) -> Result<RepositorySelection, RepositoryError> {
        let pg = &self.postgres;
        if pg.database_url.is_empty() {
            return Err(RepositoryError::configuration(
                "Postgres repository requires 'postgres.database_url' setting",
            ));
        }

        Ok(RepositorySelection::Postgres(PostgresConfig {
            database_url: pg.database_url.clone(),
            max_pool_size: pg.max_connections,
            min_pool_size: pg.min_connections,
            connection_timeout_sec: pg.connect_timeout,
            idle_timeout_sec: pg.idle_timeout,
            max_retries: pg.max_retries,
            retry_delay_ms: pg.retry_delay_ms,
        }))
    }

    #[cfg(not(feature = "postgres-repo"))]
    fn postgres_selection(&self) -> Result<RepositorySelection, RepositoryError> {
        Err(postgres_disabled())
    }
}
