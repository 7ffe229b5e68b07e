// src/engine/site.rs
// =============================================================================
// SiteEngine: the engine that ships with audit-runner.
//
// start() discovers routes (or takes the explicit url list), then spawns a
// worker task that inspects them with at most `max_workers` requests in
// flight. When the last route is done the worker stores the reports and
// fires HookEvent::WorkerFinished.
//
// Shared state between the engine and its worker task lives behind Arc:
// the hook registry and the report list.
// =============================================================================

use std::sync::{Arc, Mutex, PoisonError};

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::discover::discover_routes;
use super::inspect::inspect_route;
use super::{
    AuditEngine, CloseError, EngineError, EngineFactory, EngineOptions, HookEvent, Hooks, Route,
    RouteReport,
};

/// Builds a SiteEngine per run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteEngineFactory;

impl EngineFactory for SiteEngineFactory {
    type Engine = SiteEngine;

    fn create(&self, options: EngineOptions) -> Result<SiteEngine, EngineError> {
        let scheme_ok = matches!(options.site.scheme(), "http" | "https");
        if !scheme_ok || options.site.host_str().is_none() {
            return Err(EngineError::InvalidSite(options.site.to_string()));
        }

        let client = Client::builder()
            .timeout(options.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("audit-runner/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(SiteEngine {
            options,
            client,
            hooks: Arc::new(Hooks::new()),
            reports: Arc::new(Mutex::new(Vec::new())),
            worker: None,
            closed: false,
        })
    }
}

pub struct SiteEngine {
    options: EngineOptions,
    client: Client,
    hooks: Arc<Hooks>,
    reports: Arc<Mutex<Vec<RouteReport>>>,
    worker: Option<JoinHandle<()>>,
    closed: bool,
}

impl SiteEngine {
    async fn collect_routes(&self) -> Vec<Route> {
        let urls = match &self.options.urls {
            Some(urls) => urls.clone(),
            None => {
                discover_routes(
                    &self.client,
                    &self.options.site,
                    self.options.max_depth,
                    self.options.max_routes,
                )
                .await
            }
        };

        urls.iter().map(Route::from_url).collect()
    }
}

impl AuditEngine for SiteEngine {
    async fn start(&mut self) -> Result<Vec<Route>, EngineError> {
        if self.worker.is_some() || self.closed {
            return Err(EngineError::AlreadyStarted);
        }

        debug!(
            site = %self.options.site,
            output = %self.options.output_path.display(),
            "engine starting"
        );

        let routes = self.collect_routes().await;
        if routes.is_empty() {
            return Ok(routes);
        }

        info!(routes = routes.len(), workers = self.options.max_workers, "routes queued");

        let client = self.client.clone();
        let hooks = Arc::clone(&self.hooks);
        let store = Arc::clone(&self.reports);
        let workers = self.options.max_workers.max(1);
        let queued = routes.clone();

        self.worker = Some(tokio::spawn(async move {
            let finished: Vec<RouteReport> = stream::iter(queued)
                .map(|route| inspect_route(&client, route))
                .buffer_unordered(workers)
                .collect()
                .await;

            store
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(finished);
            hooks.call(HookEvent::WorkerFinished);
        }));

        Ok(routes)
    }

    fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    fn reports(&self) -> Vec<RouteReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn close(&mut self) -> Result<(), CloseError> {
        if self.closed {
            return Err(CloseError::DisplayClosed);
        }
        self.closed = true;
        // An aborted worker never fires, so nobody should keep waiting on it.
        self.hooks.clear();

        if let Some(worker) = self.worker.take() {
            if !worker.is_finished() {
                worker.abort();
            } else if let Err(e) = worker.await {
                return Err(CloseError::Other(format!("worker task failed: {}", e)));
            }
        }
        debug!("worker pool closed");
        Ok(())
    }
}
