// src/runner/mod.rs
// =============================================================================
// The audit run: one URL in, a RunResult (or the first error) out.
//
// What happens in run():
// 1. Validate the URL and the optional run id
// 2. Work out the output folder (reports root, or reports root/run id)
// 3. Create the engine - WITHOUT an explicit url list, so it crawls the
//    whole site instead of auditing a single page
// 4. start() the engine; zero discovered routes fails the run
// 5. Wait for the WorkerFinished signal (exactly once)
// 6. Write every report concurrently; one failed write fails the run
// 7. Close the engine, tolerating a benign "already closed" failure
//
// There is no run-level timeout. If the engine never signals, the run
// waits until the process is stopped.
// =============================================================================

mod signal;

use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{AppConfig, ResolvedPaths};
use crate::engine::{AuditEngine, EngineError, EngineFactory, EngineOptions, HookEvent};
use crate::storage::{ensure_dir, write_report, ReportEntry, ReportLayout, ReportWriteError};

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid run id '{0}': must be a single folder name")]
    InvalidRunId(String),

    #[error("failed to queue routes for scanning: no routes discovered on {site}")]
    NoRoutes { site: String },

    #[error(transparent)]
    ReportWrite(#[from] ReportWriteError),

    #[error("audit engine failed")]
    Engine(#[from] EngineError),
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub success: bool,
    pub scanned_routes: usize,
    pub duration_seconds: u64,
    pub reports: Vec<ReportEntry>,
}

/// Knobs handed to the engine and the report writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub max_workers: usize,
    pub request_timeout: Duration,
    pub max_routes: usize,
    pub max_depth: usize,
    pub layout: ReportLayout,
}

impl RunSettings {
    pub fn from_config(config: &AppConfig, layout: ReportLayout) -> Self {
        let execution = config.execution();
        let scanner = config.scanner();

        RunSettings {
            max_workers: to_usize(execution.max_workers),
            request_timeout: Duration::from_secs(execution.timeout_sec),
            max_routes: to_usize(scanner.max_routes),
            max_depth: to_usize(scanner.max_depth),
            layout,
        }
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

pub struct AuditRunner<F> {
    reports_dir: PathBuf,
    settings: RunSettings,
    factory: F,
}

impl<F: EngineFactory> AuditRunner<F> {
    pub fn new(paths: &ResolvedPaths, settings: RunSettings, factory: F) -> Self {
        AuditRunner {
            reports_dir: paths.reports_dir.clone(),
            settings,
            factory,
        }
    }

    /// Audits `url`, namespacing output under `run_id` when given.
    pub async fn run(&self, url: &str, run_id: Option<&str>) -> Result<RunResult, AuditError> {
        let started = Instant::now();

        let site = parse_site_url(url)?;
        let host = site.host_str().unwrap_or_default().to_string();

        let output_path = match run_id {
            Some(id) => self.reports_dir.join(validate_run_id(id)?),
            None => self.reports_dir.clone(),
        };
        ensure_dir(&output_path)
            .await
            .map_err(|source| ReportWriteError::Io {
                path: output_path.clone(),
                source,
            })?;

        let mut engine = self.factory.create(EngineOptions {
            site: site.clone(),
            output_path: output_path.clone(),
            // Leave this unset: an explicit list limits the scan to those
            // pages and turns route discovery off.
            urls: None,
            max_workers: self.settings.max_workers,
            request_timeout: self.settings.request_timeout,
            max_routes: self.settings.max_routes,
            max_depth: self.settings.max_depth,
        })?;

        let routes = engine.start().await?;
        if routes.is_empty() {
            close_engine(&mut engine).await;
            return Err(AuditError::NoRoutes {
                site: site.to_string(),
            });
        }
        info!(site = %site, routes = routes.len(), "scan started");

        let finished = signal::once(engine.hooks(), HookEvent::WorkerFinished);
        finished.await.map_err(|_| EngineError::SignalDropped)?;

        let duration_seconds = started.elapsed().as_secs_f64().round() as u64;
        let reports = engine.reports();
        debug!(reports = reports.len(), "worker pool finished");

        let layout = self.settings.layout;
        let entries = try_join_all(
            reports
                .iter()
                .map(|report| write_report(report, &output_path, &host, layout)),
        )
        .await?;

        for entry in &entries {
            info!(url = %entry.url, file = %entry.file.display(), "result written");
        }

        close_engine(&mut engine).await;

        Ok(RunResult {
            success: true,
            scanned_routes: routes.len(),
            duration_seconds,
            reports: entries,
        })
    }
}

// Reports are already on disk by the time this runs, so a failed close is
// never fatal.
async fn close_engine<E: AuditEngine>(engine: &mut E) {
    match engine.close().await {
        Ok(()) => {}
        Err(e) if e.is_benign() => debug!(error = %e, "ignoring benign worker pool close error"),
        Err(e) => warn!(error = %e, "error closing worker pool"),
    }
}

fn parse_site_url(url: &str) -> Result<Url, AuditError> {
    let invalid = |reason: String| AuditError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(parsed)
}

fn validate_run_id(id: &str) -> Result<&str, AuditError> {
    let mut components = Path::new(id).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if !single_normal || id.contains(['/', '\\']) {
        return Err(AuditError::InvalidRunId(id.to_string()));
    }
    Ok(id)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is AuditRunner generic over F: EngineFactory?
//    - The runner only needs "something that can build an engine"
//    - main.rs passes SiteEngineFactory; the tests pass a fake
//    - Generics are resolved at compile time, so there is no runtime cost
//
// 2. What does try_join_all do?
//    - Runs all the write futures concurrently
//    - Resolves to Ok(Vec) if every one succeeds
//    - Resolves to the first Err as soon as one fails (the rest are dropped)
//    - Files that were already written stay on disk
//
// 3. Why `?` on so many different error types?
//    - AuditError has #[from] conversions for EngineError and
//      ReportWriteError, so `?` converts them automatically
// -----------------------------------------------------------------------------
