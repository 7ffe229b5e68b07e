// src/config/loader.rs
// =============================================================================
// Reads config.yml, validates it, and resolves the absolute output folders.
//
// How it works:
// 1. Read the file (missing file and I/O failures are separate errors)
// 2. Parse YAML into AppConfig with serde_yaml
// 3. Run AppConfig::validate() for the rules serde can't express
// 4. resolve() joins the relative folders onto the project directory
//
// Rust concepts:
// - thiserror: Derives std::error::Error + Display for our error enum
// - #[source] / #[from]: Keep the underlying error for the context chain
// =============================================================================

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::schema::AppConfig;

/// Config file looked up when --config is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {} is not valid YAML for this schema", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration in {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

// Absolute directories derived from the config.
// temp_dir and reports_dir are created by storage::prepare_output_dirs
// before any run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPaths {
    pub project_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub artifacts_dir: PathBuf,
}

/// Loads and validates the configuration at `config_path`.
pub async fn load(config_path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::Missing {
                path: config_path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: config_path.to_path_buf(),
                source,
            });
        }
    };

    let config: AppConfig =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })?;

    config.validate().map_err(|reason| ConfigError::Invalid {
        path: config_path.to_path_buf(),
        reason,
    })?;

    debug!(path = %config_path.display(), "configuration loaded");
    Ok(config)
}

impl AppConfig {
    /// Resolves every output folder against the project directory.
    ///
    /// `base_dir` is where a missing or relative `projectDir` is anchored,
    /// normally the directory holding the config file.
    pub fn resolve(&self, base_dir: &Path) -> ResolvedPaths {
        let project_dir = self.paths.project_dir(base_dir);
        let temp_dir = project_dir.join(&self.paths.temp_dir);
        let reports_dir = temp_dir.join(&self.paths.unlighthouse_reports);
        let artifacts_dir = temp_dir.join(&self.paths.unlighthouse_artifacts);

        ResolvedPaths {
            project_dir,
            temp_dir,
            reports_dir,
            artifacts_dir,
        }
    }
}

/// Directory a config file lives in, made absolute against the cwd.
pub fn base_dir_of(config_path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if config_path.is_absolute() {
        config_path.to_path_buf()
    } else {
        std::env::current_dir()?.join(config_path)
    };

    let parent = absolute.parent().map(Path::to_path_buf);
    Ok(parent.unwrap_or(absolute))
}
