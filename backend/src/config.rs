//! Application configuration.
//!
//! Settings are read from a TOML file and then overridden by environment
//! variables:
//!
//! ```toml
//! [repository]
//! type = "rest"            # "local" or "rest"
//!
//! [rest]
//! base_url = "http://localhost:3000"
//! timeout_secs = 10
//!
//! [local]
//! seed_file = "facilities.json"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! session_ttl_secs = 1800
//! ```
//!
//! # Environment Variables
//! - `REPOSITORY_TYPE`: overrides `[repository] type`
//! - `FACILITY_API_URL`: overrides `[rest] base_url`
//! - `FACILITY_SEED_FILE`: overrides `[local] seed_file`
//! - `HOST` / `PORT`: override `[server]`
//! - `SESSION_TTL_SECS`: overrides `[server] session_ttl_secs`

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::db::factory::RepositoryType;
use crate::db::repository::RepositoryError;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub rest: RestSettings,
    #[serde(default)]
    pub local: LocalSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

/// Repository type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

/// Facility REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RestSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// In-memory repository settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalSettings {
    /// JSON file with `hospitals` and `labs` arrays to preload.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Idle seconds before a comparison session is dropped.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_repo_type() -> String {
    "local".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_ttl_secs() -> u64 {
    30 * 60
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(AppConfig)` if successful
    /// * `Err(RepositoryError)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `compare.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = [
            PathBuf::from("compare.toml"),
            PathBuf::from("backend/compare.toml"),
            PathBuf::from("../compare.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(RepositoryError::configuration(
            "No compare.toml found in standard locations",
        ))
    }

    /// Default-location file if present (built-in defaults otherwise), with
    /// environment overrides applied.
    pub fn load() -> Result<Self, RepositoryError> {
        let mut config = match Self::from_default_location() {
            Ok(config) => config,
            Err(RepositoryError::ConfigurationError { ref message, .. })
                if message.starts_with("No compare.toml") =>
            {
                log::info!("no compare.toml found, using built-in defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `REPOSITORY_TYPE`, `FACILITY_API_URL`, `FACILITY_SEED_FILE`,
    /// `HOST`, `PORT` and `SESSION_TTL_SECS`.
    pub fn apply_env_overrides(&mut self) -> Result<(), RepositoryError> {
        if let Ok(url) = env::var("FACILITY_API_URL") {
            self.rest.base_url = url;
            if env::var("REPOSITORY_TYPE").is_err() {
                self.repository.repo_type = "rest".to_string();
            }
        }
        if let Ok(repo_type) = env::var("REPOSITORY_TYPE") {
            self.repository.repo_type = repo_type;
        }
        if let Ok(seed) = env::var("FACILITY_SEED_FILE") {
            self.local.seed_file = Some(PathBuf::from(seed));
        }
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = port.parse().map_err(|_| {
                RepositoryError::configuration(format!("PORT must be a valid port number, got '{}'", port))
            })?;
        }
        if let Ok(ttl) = env::var("SESSION_TTL_SECS") {
            self.server.session_ttl_secs = ttl.parse().map_err(|_| {
                RepositoryError::configuration(format!(
                    "SESSION_TTL_SECS must be a whole number of seconds, got '{}'",
                    ttl
                ))
            })?;
        }
        Ok(())
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, RepositoryError> {
        RepositoryType::from_str(&self.repository.repo_type).map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })
    }

    /// REST client settings.
    #[cfg(feature = "rest-repo")]
    pub fn rest_config(&self) -> crate::db::repositories::RestConfig {
        crate::db::repositories::RestConfig::new(self.rest.base_url.clone())
            .with_timeout(std::time::Duration::from_secs(self.rest.timeout_secs))
    }

    /// Idle time after which a comparison session expires.
    pub fn session_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.server.session_ttl_secs)
    }

    /// `host:port` to bind the HTTP server to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
