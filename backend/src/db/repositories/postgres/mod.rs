//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//! - Conflict-checked saves serialized with a table lock
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::api::RoutineKey;
use crate::db::checksum::routine_checksum;
use crate::db::repository::{
    ErrorContext, RepositoryError, RepositoryResult, RoutineRepository, SaveOutcome, SavedRoutine,
};
use crate::models::routine::{Routine, StoredRoutine};
use crate::services::conflicts::{check_routine, TeacherMatching};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Blocks concurrent writers (and other holders of this mode) while still
/// allowing plain reads.
const LOCK_ROUTINES: &str = "LOCK TABLE routines IN SHARE ROW EXCLUSIVE MODE";

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// Blocks while the pool fills and migrations run; call it from
    /// `spawn_blocking` when inside a runtime.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, config })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times with exponential backoff when the
    /// connection cannot be acquired or the operation fails with a
    /// retryable error.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    log::debug!("Retrying database operation (attempt {})", attempt + 1);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn load_routines(
    conn: &mut PgConnection,
    exclude: Option<&RoutineKey>,
) -> RepositoryResult<Vec<StoredRoutine>> {
    let mut query = routines::table
        .select(RoutineRow::as_select())
        .order((routines::class_name.asc(), routines::section.asc()))
        .into_boxed();
    if let Some(key) = exclude {
        query = query.filter(
            routines::class_name
                .ne(&key.class_name)
                .or(routines::section.ne(&key.section)),
        );
    }
    query
        .load::<RoutineRow>(conn)?
        .into_iter()
        .map(RoutineRow::into_stored)
        .collect()
}

fn find_routine(conn: &mut PgConnection, key: &RoutineKey) -> RepositoryResult<Option<RoutineRow>> {
    Ok(routines::table
        .filter(routines::class_name.eq(&key.class_name))
        .filter(routines::section.eq(&key.section))
        .select(RoutineRow::as_select())
        .first::<RoutineRow>(conn)
        .optional()?)
}

fn not_found(key: &RoutineKey, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Routine for class {} not found", key),
        ErrorContext::new(operation).with_routine(key),
    )
}

/// Insert or replace inside an open transaction. An identical schedule is
/// left untouched so `updated_at` only moves on real changes.
fn upsert_in(conn: &mut PgConnection, routine: &Routine) -> RepositoryResult<SavedRoutine> {
    let checksum = routine_checksum(routine);
    if let Some(existing) = find_routine(conn, &routine.key())? {
        if existing.checksum == checksum {
            return Ok(SavedRoutine {
                routine: existing.into_stored()?,
                changed: false,
            });
        }
    }

    let row = NewRoutineRow::from_routine(routine, checksum)?;
    let saved: RoutineRow = diesel::insert_into(routines::table)
        .values(&row)
        .on_conflict((routines::class_name, routines::section))
        .do_update()
        .set((
            routines::week_schedule_json.eq(excluded(routines::week_schedule_json)),
            routines::checksum.eq(excluded(routines::checksum)),
            routines::updated_at.eq(Utc::now()),
        ))
        .returning(RoutineRow::as_returning())
        .get_result(conn)?;

    Ok(SavedRoutine {
        routine: saved.into_stored()?,
        changed: true,
    })
}

#[async_trait]
impl RoutineRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn list_routines(&self) -> RepositoryResult<Vec<StoredRoutine>> {
        self.with_conn(|conn| load_routines(conn, None))
            .await
            .map_err(|e| e.with_operation("list_routines"))
    }

    async fn get_routine(&self, key: &RoutineKey) -> RepositoryResult<StoredRoutine> {
        let key = key.clone();
        self.with_conn(move |conn| match find_routine(conn, &key)? {
            Some(row) => row.into_stored(),
            None => Err(not_found(&key, "get_routine")),
        })
        .await
    }

    async fn list_other_routines(
        &self,
        exclude: &RoutineKey,
    ) -> RepositoryResult<Vec<StoredRoutine>> {
        let exclude = exclude.clone();
        self.with_conn(move |conn| load_routines(conn, Some(&exclude)))
            .await
            .map_err(|e| e.with_operation("list_other_routines"))
    }

    async fn upsert_routine(&self, routine: &Routine) -> RepositoryResult<SavedRoutine> {
        let routine = routine.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| upsert_in(tx, &routine))
        })
        .await
        .map_err(|e| e.with_operation("upsert_routine"))
    }

    async fn delete_routine(&self, key: &RoutineKey) -> RepositoryResult<StoredRoutine> {
        let key = key.clone();
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                routines::table
                    .filter(routines::class_name.eq(&key.class_name))
                    .filter(routines::section.eq(&key.section)),
            )
            .returning(RoutineRow::as_returning())
            .get_result::<RoutineRow>(conn)
            .optional()?;
            match deleted {
                Some(row) => row.into_stored(),
                None => Err(not_found(&key, "delete_routine")),
            }
        })
        .await
    }

    async fn save_routine_checked(
        &self,
        routine: &Routine,
        matching: TeacherMatching,
    ) -> RepositoryResult<SaveOutcome> {
        let routine = routine.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                sql_query(LOCK_ROUTINES).execute(tx)?;
                let others = load_routines(tx, Some(&routine.key()))?;
                if let Err(conflict) = check_routine(&routine, &others, matching) {
                    return Ok(SaveOutcome::Rejected(conflict));
                }
                Ok(SaveOutcome::Saved(upsert_in(tx, &routine)?))
            })
        })
        .await
        .map_err(|e| e.with_operation("save_routine_checked"))
    }
}
