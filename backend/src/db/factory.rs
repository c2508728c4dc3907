//! Repository factory for dependency injection.
//!
//! This module provides utilities for creating and configuring repository instances
//! based on runtime configuration.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::repositories::LocalRepository;
#[cfg(feature = "rest-repo")]
use super::repositories::{RestConfig, RestRepository};
use super::repository::{FacilityRepository, RepositoryResult};
use crate::config::AppConfig;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
    /// Listing REST API
    Rest,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("local", "rest").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "rest" | "http" | "api" => Ok(Self::Rest),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from environment variable.
    ///
    /// Reads `REPOSITORY_TYPE`. Defaults to Rest if `FACILITY_API_URL` is
    /// present, otherwise Local.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var("FACILITY_API_URL").is_ok() {
            Self::Rest
        } else {
            Self::Local
        }
    }
}

/// Repository factory for creating repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create the repository described by `config`.
    ///
    /// # Returns
    /// * `Ok(Arc<dyn FacilityRepository>)` - Shared repository instance
    /// * `Err(RepositoryError)` - If the type is unknown, its feature is
    ///   disabled, or initialization fails
    pub fn create(config: &AppConfig) -> RepositoryResult<Arc<dyn FacilityRepository>> {
        match config.repository_type()? {
            RepositoryType::Local => match &config.local.seed_file {
                Some(path) => Self::create_local_seeded(path),
                None => Ok(Self::create_local()),
            },
            RepositoryType::Rest => {
                #[cfg(feature = "rest-repo")]
                {
                    let rest = Self::create_rest(&config.rest_config())?;
                    Ok(rest as Arc<dyn FacilityRepository>)
                }
                #[cfg(not(feature = "rest-repo"))]
                {
                    Err(super::repository::RepositoryError::configuration(
                        "REST repository feature not enabled",
                    ))
                }
            }
        }
    }

    /// Create an empty in-memory local repository.
    pub fn create_local() -> Arc<dyn FacilityRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create an in-memory repository preloaded from a seed file.
    pub fn create_local_seeded<P: AsRef<Path>>(
        path: P,
    ) -> RepositoryResult<Arc<dyn FacilityRepository>> {
        Ok(Arc::new(LocalRepository::from_json_file(path)?))
    }

    /// Create a REST repository.
    #[cfg(feature = "rest-repo")]
    pub fn create_rest(config: &RestConfig) -> RepositoryResult<Arc<RestRepository>> {
        Ok(Arc::new(RestRepository::new(config)?))
    }

    /// Create a repository from a TOML configuration file.
    pub fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FacilityRepository>> {
        let config = AppConfig::from_file(config_path)?;
        Self::create(&config)
    }

    /// Create a repository from environment variables alone.
    pub fn from_env() -> RepositoryResult<Arc<dyn FacilityRepository>> {
        let mut config = AppConfig::default();
        config.apply_env_overrides()?;
        if std::env::var("REPOSITORY_TYPE").is_err() {
            config.repository.repo_type = match RepositoryType::from_env() {
                RepositoryType::Local => "local",
                RepositoryType::Rest => "rest",
            }
            .to_string();
        }
        Self::create(&config)
    }
}
