// src/config/schema.rs
// =============================================================================
// The shape of config.yml.
//
// Example:
//
//   paths:
//     temp_dir: temp
//     unlighthouse_reports: reports
//     unlighthouse_artifacts: artifacts
//     projectDir: /srv/audits        # optional
//   execution:                       # optional
//     max_workers: 4
//     timeout_sec: 30
//   scanner:                         # optional
//     max_routes: 200
//     max_depth: 3
//
// serde does the structural checks (required keys, types, no negative
// numbers). validate() does the rest: empty strings, zeros, and paths that
// would escape the project directory.
// =============================================================================

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_MAX_WORKERS: u64 = 4;
pub const DEFAULT_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_MAX_ROUTES: u64 = 200;
pub const DEFAULT_MAX_DEPTH: u64 = 3;

// Unknown keys are ignored on purpose: the same file is shared with other
// tooling that has its own sections.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub paths: PathsConfig,
    #[serde(default)]
    pub execution: Option<ExecutionConfig>,
    #[serde(default)]
    pub scanner: Option<ScannerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub temp_dir: String,
    pub unlighthouse_reports: String,
    pub unlighthouse_artifacts: String,
    /// Root every other path is resolved against.
    /// Defaults to the directory holding the config file.
    #[serde(rename = "projectDir", default)]
    pub project_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExecutionConfig {
    pub max_workers: u64,
    pub timeout_sec: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            timeout_sec: DEFAULT_TIMEOUT_SEC,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_max_routes")]
    pub max_routes: u64,
    #[serde(default = "default_max_depth")]
    pub max_depth: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_routes: DEFAULT_MAX_ROUTES,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

fn default_max_routes() -> u64 {
    DEFAULT_MAX_ROUTES
}

fn default_max_depth() -> u64 {
    DEFAULT_MAX_DEPTH
}

impl AppConfig {
    /// Execution settings with defaults applied when the section is absent.
    pub fn execution(&self) -> ExecutionConfig {
        self.execution.unwrap_or_default()
    }

    pub fn scanner(&self) -> ScannerConfig {
        self.scanner.unwrap_or_default()
    }

    /// Checks the rules serde can't express.
    /// Returns a human-readable reason for the first violation.
    pub fn validate(&self) -> Result<(), String> {
        let paths = &self.paths;

        check_relative_dir("paths.temp_dir", &paths.temp_dir)?;
        check_relative_dir("paths.unlighthouse_reports", &paths.unlighthouse_reports)?;
        check_relative_dir("paths.unlighthouse_artifacts", &paths.unlighthouse_artifacts)?;

        if let Some(project_dir) = &paths.project_dir {
            if project_dir.trim().is_empty() {
                return Err("paths.projectDir must not be empty".to_string());
            }
        }

        if let Some(execution) = &self.execution {
            check_positive("execution.max_workers", execution.max_workers)?;
            check_positive("execution.timeout_sec", execution.timeout_sec)?;
        }

        if let Some(scanner) = &self.scanner {
            check_positive("scanner.max_routes", scanner.max_routes)?;
            check_positive("scanner.max_depth", scanner.max_depth)?;
        }

        Ok(())
    }
}

// Output folders are always nested under the project directory, so they
// must be plain relative paths that never climb out with "..".
fn check_relative_dir(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }

    let path = Path::new(value);
    if path.is_absolute() || path.has_root() {
        return Err(format!("{} must be a relative path, got '{}'", field, value));
    }

    let escapes = path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(format!(
            "{} must stay inside the project directory, got '{}'",
            field, value
        ));
    }

    Ok(())
}

fn check_positive(field: &str, value: u64) -> Result<(), String> {
    if value == 0 {
        return Err(format!("{} must be a positive integer", field));
    }
    Ok(())
}

impl PathsConfig {
    /// The project directory, resolved against `base_dir` when relative.
    pub fn project_dir(&self, base_dir: &Path) -> PathBuf {
        match &self.project_dir {
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        }
    }
}
