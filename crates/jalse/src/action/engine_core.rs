//! # EngineCore
//!
//! State shared by every [`super::ActionEngine`] backing: the work queue,
//! engine-scoped bindings, and the pause/stop flags. The three variants
//! (manual, fork-join, thread-pool) each wrap one `EngineCore` and add the
//! dispatch mechanics that make it actually run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::bindings::Bindings;
use crate::error::{JalseError, JalseResult};

use super::context::{ActionContext, Periodicity};
use super::engine::DEFAULT_SPIN_YIELD_THRESHOLD;
use super::queue::WorkQueue;

pub(crate) struct EngineCore<T> {
    pub(crate) queue: WorkQueue<T>,
    pub(crate) bindings: Bindings,
    paused: AtomicBool,
    stopped: AtomicBool,
    pub(crate) resume_lock: Mutex<()>,
    pub(crate) resume_cvar: Condvar,
}

impl<T> EngineCore<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: WorkQueue::new(),
            bindings: Bindings::new(),
            paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            resume_lock: Mutex::new(()),
            resume_cvar: Condvar::new(),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_detached() -> Arc<Self> {
        Self::new()
    }

    pub(crate) fn enqueue(&self, ctx: Arc<ActionContext<T>>) -> JalseResult<()> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(JalseError::EngineStopped);
        }
        self.queue.add(ctx);
        Ok(())
    }

    pub(crate) fn notify(&self) {
        self.queue.notify();
        self.resume_cvar.notify_all();
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub(crate) fn set_paused(&self, value: bool) {
        self.paused.store(value, Ordering::Release);
        if !value {
            self.notify();
        }
    }

    /// Cancels everything currently waiting and marks the engine stopped.
    /// Idempotent. Returns the contexts that were cancelled, so in-flight
    /// worker threads can be told to finish up.
    pub(crate) fn begin_stop(&self) -> Vec<Arc<ActionContext<T>>> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Vec::new();
        }
        let waiting = self.queue.clear();
        for ctx in &waiting {
            ctx.cancel();
        }
        self.notify();
        waiting
    }

    /// Blocks the calling thread while the engine is paused; returns
    /// immediately once resumed or stopped.
    pub(crate) fn wait_while_paused(&self) {
        let mut guard = self.resume_lock.lock();
        while self.is_paused() && !self.is_stopped() {
            self.resume_cvar.wait(&mut guard);
        }
    }
}

/// The cooperative worker loop shared by the fork-join and thread-pool
/// backings: pop the next ready context (or sleep until it would be ready),
/// perform it, and re-queue it according to `mode` if it is periodic.
pub(crate) fn run_worker_loop<T: Clone + Send + Sync + 'static>(
    core: Arc<EngineCore<T>>,
    mode: Periodicity,
) {
    loop {
        core.wait_while_paused();
        if core.is_stopped() {
            return;
        }
        match core.queue.poll_ready() {
            Some(ctx) => {
                if !ctx.begin_perform() {
                    continue;
                }
                let result = ctx.action().perform(&ctx);
                if let Some(resubmit) = ctx.finish_perform(result, mode) {
                    core.queue.add(resubmit);
                }
            }
            None => {
                if core.is_stopped() {
                    return;
                }
                core.queue.await_next_ready(DEFAULT_SPIN_YIELD_THRESHOLD);
            }
        }
    }
}
