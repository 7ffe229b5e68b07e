// src/runner/signal.rs
// =============================================================================
// Turns the engine's WorkerFinished hook into a future that resolves once.
//
// The hook registry calls its listeners every time an event fires. A run
// must settle exactly once, so the listener owns the only oneshot Sender
// inside an Option and take()s it on the first call. Any later call finds
// None, logs it, and does nothing.
//
// Rust concepts:
// - tokio::sync::oneshot: A channel that carries exactly one value
// - Option::take(): Moves the value out and leaves None behind
// =============================================================================

use tokio::sync::oneshot;
use tracing::warn;

use crate::engine::{HookEvent, Hooks};

/// Subscribes to `event` and returns a receiver that completes on its first
/// firing.
pub fn once(hooks: &Hooks, event: HookEvent) -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    let mut sender = Some(tx);

    hooks.hook(event, move || match sender.take() {
        // The receiver may already be gone if the run failed; that's fine.
        Some(tx) => {
            let _ = tx.send(());
        }
        None => warn!(?event, "event fired again after the run settled, ignoring"),
    });

    rx
}
