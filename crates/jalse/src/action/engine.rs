//! # ActionEngine
//!
//! The scheduler contract implemented by the three execution backings
//! ([`super::manual::ManualEngine`], [`super::fork_join::ForkJoinEngine`],
//! [`super::thread_pool::ThreadPoolEngine`]). An engine owns one work queue,
//! drives contexts through their state machine, and enforces pause/stop.

use std::sync::Arc;

use crate::bindings::Bindings;
use crate::error::JalseResult;

use super::context::{Action, ActionContext};

/// Default bound on how long [`ActionEngine::stop`] waits for in-flight work
/// to notice cancellation before the call returns anyway.
pub const DEFAULT_TERMINATION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);

/// Default upper bound an engine's dispatch loop will sleep for when the
/// queue is empty, so a `stop()` is always noticed promptly.
pub const DEFAULT_SPIN_YIELD_THRESHOLD: std::time::Duration =
    std::time::Duration::from_millis(10);

pub trait ActionEngine<T>: Send + Sync {
    /// Engine-scoped bindings, inherited as the source bindings for every
    /// context this engine creates.
    fn bindings(&self) -> &Bindings;

    /// Returns a fresh, unscheduled context bound to this engine.
    fn new_context(&self, action: Arc<dyn Action<T>>) -> Arc<ActionContext<T>>;

    /// Convenience: creates a context, assigns the actor, and schedules it
    /// with zero delay and zero period.
    fn schedule(
        &self,
        action: Arc<dyn Action<T>>,
        actor: Option<T>,
    ) -> JalseResult<Arc<ActionContext<T>>>;

    /// Stops dispatch. Existing contexts remain queued; new `schedule` calls
    /// are still accepted and simply wait.
    fn pause(&self);

    /// Resumes dispatch and wakes any waiters.
    fn resume(&self) -> JalseResult<()>;

    /// Permanently stops the engine: cancels all waiting work, makes a
    /// best-effort attempt to interrupt in-flight work, and rejects further
    /// scheduling. Idempotent.
    fn stop(&self);

    fn is_paused(&self) -> bool;
    fn is_stopped(&self) -> bool;
}
