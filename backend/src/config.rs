//! Server configuration from environment variables.
//!
//! # Environment Variables
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `MAX_BODY_BYTES`: Request body limit (default: 1 MiB)
//! - `TEACHER_MATCHING`: `exact` or `normalized`. Overrides the
//!   `[conflicts] teacher_matching` setting of `repository.toml`.
//! - `REPOSITORY_CONFIG`: explicit path to `repository.toml`.

use anyhow::{Context, Result};
use std::net::SocketAddr;

use crate::db::RepositoryConfig;
use crate::services::conflicts::TeacherMatching;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub teacher_matching: TeacherMatching,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            teacher_matching: TeacherMatching::default(),
        }
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid {}='{}': {}", name, raw, e)),
        Err(_) => Ok(None),
    }
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// A malformed value is an error rather than a silent fallback, and so
    /// is a `repository.toml` that exists but does not parse.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let teacher_matching = match parse_var::<TeacherMatching>("TEACHER_MATCHING")? {
            Some(matching) => matching,
            None => RepositoryConfig::discover()
                .context("Failed to load repository.toml")?
                .map(|c| c.conflicts.teacher_matching)
                .unwrap_or(defaults.teacher_matching),
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            max_body_bytes: parse_var("MAX_BODY_BYTES")?.unwrap_or(defaults.max_body_bytes),
            teacher_matching,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}
