// src/engine/mod.rs
// =============================================================================
// The audit engine boundary.
//
// The runner never crawls or inspects pages itself. It talks to an engine
// through the small surface defined here:
//
//   EngineFactory::create(options) -> engine
//   engine.start()                 -> discovered routes (worker pool starts)
//   engine.hooks().hook(event, f)  -> subscribe to WorkerFinished
//   engine.reports()               -> one RouteReport per finished route
//   engine.close()                 -> shut the worker pool down
//
// Submodules:
// - hooks: Named-event registry the engine fires into
// - discover: Breadth-first same-host route discovery
// - inspect: One GET per route, turned into a report
// - site: SiteEngine, the bundled engine built from discover + inspect
// =============================================================================

mod discover;
mod hooks;
mod inspect;
mod site;

pub use hooks::{HookEvent, Hooks};
pub use site::SiteEngineFactory;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

/// A page discovered within the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub url: String,
    pub path: String,
}

impl Route {
    pub fn from_url(url: &Url) -> Self {
        Route {
            url: url.to_string(),
            path: url.path().to_string(),
        }
    }
}

/// Result of auditing one route.
///
/// Only `route` is part of the contract; everything else is whatever the
/// engine chose to record and is written out untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteReport {
    pub route: Route,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// Everything an engine needs to scan one site.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub site: Url,
    pub output_path: PathBuf,
    /// Explicit route list. Setting this turns discovery off and limits
    /// the scan to exactly these URLs.
    pub urls: Option<Vec<Url>>,
    pub max_workers: usize,
    pub request_timeout: Duration,
    pub max_routes: usize,
    pub max_depth: usize,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("engine cannot scan '{0}'")]
    InvalidSite(String),

    #[error("engine was already started")]
    AlreadyStarted,

    #[error("engine dropped the completion signal before firing it")]
    SignalDropped,
}

/// Failure while shutting the worker pool down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseError {
    #[error("display.close: worker pool display is already closed")]
    DisplayClosed,

    #[error("failed to close worker pool: {0}")]
    Other(String),
}

impl CloseError {
    /// True for the harmless "display already closed" case.
    ///
    /// Engines that can only report an untyped message are matched on the
    /// `display.close` substring.
    pub fn is_benign(&self) -> bool {
        match self {
            CloseError::DisplayClosed => true,
            CloseError::Other(message) => message.contains("display.close"),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait AuditEngine {
    /// Discovers routes and starts the worker pool on them.
    async fn start(&mut self) -> Result<Vec<Route>, EngineError>;

    fn hooks(&self) -> &Hooks;

    /// Reports collected so far; complete once WorkerFinished has fired.
    fn reports(&self) -> Vec<RouteReport>;

    async fn close(&mut self) -> Result<(), CloseError>;
}

pub trait EngineFactory {
    type Engine: AuditEngine;

    fn create(&self, options: EngineOptions) -> Result<Self::Engine, EngineError>;
}
