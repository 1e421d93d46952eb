//! Environment-driven configuration

use crate::db::{Database, DbError, NewResource};
use crate::services::ServicesConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read seed file {}: {source}", path.display())]
    SeedRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid seed file {}: {source}", path.display())]
    SeedParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Process configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// JSON array of resources loaded into an empty catalog at startup
    pub seed_path: Option<PathBuf>,
    pub services: ServicesConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let db_path = std::env::var("LMS_DB_PATH").map_or_else(
            |_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(format!("{home}/.ussd-lms/lms.db"))
            },
            PathBuf::from,
        );

        let port = std::env::var("LMS_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let seed_path = std::env::var("LMS_SEED_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self {
            db_path,
            port,
            seed_path,
            services: ServicesConfig::from_env(),
        }
    }
}

/// Parse a seed file
pub fn read_seed(path: &Path) -> Result<Vec<NewResource>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SeedRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::SeedParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the seed file into the catalog when the catalog is empty.
/// Returns the number of resources inserted.
pub fn seed_if_empty(db: &Database, path: &Path) -> Result<usize, ConfigError> {
    if db.resource_count()? > 0 {
        tracing::debug!("Catalog already populated, skipping seed");
        return Ok(0);
    }
    let resources = read_seed(path)?;
    for resource in &resources {
        db.insert_resource(resource)?;
    }
    tracing::info!(path = %path.display(), count = resources.len(), "Seeded catalog");
    Ok(resources.len())
}
