// src/engine/hooks.rs
// =============================================================================
// A tiny event registry: the engine calls `call(event)`, subscribers
// register with `hook(event, callback)`.
//
// Events are remembered once fired. Registering a callback for an event
// that already happened runs it straight away, so a subscriber that shows
// up after a very fast worker pool still hears about it.
//
// Rust concepts:
// - Box<dyn FnMut() + Send>: A heap-allocated closure we can store in a Vec
// - Mutex: Callbacks are registered from the runner and fired from the
//   worker task, which may be on another thread
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Every queued route has been processed by the worker pool.
    WorkerFinished,
}

type Callback = Box<dyn FnMut() + Send>;

#[derive(Default)]
struct Registry {
    listeners: HashMap<HookEvent, Vec<Callback>>,
    fired: HashSet<HookEvent>,
}

#[derive(Default)]
pub struct Hooks {
    registry: Mutex<Registry>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `event`.
    pub fn hook<F>(&self, event: HookEvent, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        let mut callback: Callback = Box::new(callback);

        {
            let mut registry = self.lock();
            if !registry.fired.contains(&event) {
                registry.listeners.entry(event).or_default().push(callback);
                return;
            }
        }

        debug!(?event, "hook registered after event fired, calling now");
        callback();
        self.lock().listeners.entry(event).or_default().push(callback);
    }

    /// Fires `event`, running every registered callback in order.
    pub fn call(&self, event: HookEvent) {
        // Callbacks run outside the lock so they may register more hooks.
        let mut listeners = {
            let mut registry = self.lock();
            registry.fired.insert(event);
            registry.listeners.remove(&event).unwrap_or_default()
        };

        debug!(?event, listeners = listeners.len(), "firing hook");
        for listener in listeners.iter_mut() {
            listener();
        }

        let mut registry = self.lock();
        let added_meanwhile = registry.listeners.remove(&event).unwrap_or_default();
        listeners.extend(added_meanwhile);
        registry.listeners.insert(event, listeners);
    }

    /// Drops every registered callback without calling it.
    pub fn clear(&self) {
        let dropped: usize = self.lock().listeners.drain().map(|(_, l)| l.len()).sum();
        debug!(dropped, "hook listeners cleared");
    }

    // A panicking callback never runs while the lock is held, so a poisoned
    // registry is still consistent.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
