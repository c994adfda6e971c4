//! # Fork-join engine
//!
//! A pool of worker threads pulling from a shared [`super::queue::WorkQueue`].
//! Each worker waits cooperatively until its next context's estimated fire
//! time, honoring pause and cancellation, then performs it on the spot.
//! Periodic contexts resubmit with `estimated = now + period` (elapsed-time
//! mode).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::error::{JalseError, JalseResult};

use super::context::{Action, ActionContext, Periodicity};
use super::engine::{ActionEngine, DEFAULT_TERMINATION_TIMEOUT};
use super::engine_core::{run_worker_loop, EngineCore};

pub struct ForkJoinEngine<T> {
    core: Arc<EngineCore<T>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    active_workers: Arc<AtomicUsize>,
    idle_cvar: Arc<Condvar>,
    idle_lock: Arc<Mutex<()>>,
}

impl<T: Clone + Send + Sync + 'static> ForkJoinEngine<T> {
    /// Spawns `worker_count` threads sharing one work queue.
    pub fn new(worker_count: usize) -> Self {
        let core = EngineCore::new();
        let active_workers = Arc::new(AtomicUsize::new(worker_count));
        let idle_cvar = Arc::new(Condvar::new());
        let idle_lock = Arc::new(Mutex::new(()));

        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let core = Arc::clone(&core);
            let active = Arc::clone(&active_workers);
            let idle_cvar = Arc::clone(&idle_cvar);
            let idle_lock = Arc::clone(&idle_lock);
            handles.push(std::thread::spawn(move || {
                run_worker_loop(core, Periodicity::Elapsed);
                active.fetch_sub(1, Ordering::AcqRel);
                let _guard = idle_lock.lock();
                idle_cvar.notify_all();
            }));
        }

        Self {
            core,
            handles: Mutex::new(handles),
            active_workers,
            idle_cvar,
            idle_lock,
        }
    }

    pub fn common(worker_count: usize) -> Self {
        Self::new(worker_count)
    }
}

impl<T: Clone + Send + Sync + 'static> ActionEngine<T> for ForkJoinEngine<T> {
    fn bindings(&self) -> &crate::bindings::Bindings {
        &self.core.bindings
    }

    fn new_context(&self, action: Arc<dyn Action<T>>) -> Arc<ActionContext<T>> {
        ActionContext::new(Arc::downgrade(&self.core), action, &self.core.bindings)
    }

    fn schedule(
        &self,
        action: Arc<dyn Action<T>>,
        actor: Option<T>,
    ) -> JalseResult<Arc<ActionContext<T>>> {
        let ctx = self.new_context(action);
        ctx.set_actor(actor);
        ctx.schedule()?;
        Ok(ctx)
    }

    fn pause(&self) {
        self.core.set_paused(true);
    }

    fn resume(&self) -> JalseResult<()> {
        if self.core.is_stopped() {
            return Err(JalseError::EngineStopped);
        }
        self.core.set_paused(false);
        Ok(())
    }

    fn stop(&self) {
        self.core.begin_stop();
        let deadline = Instant::now() + DEFAULT_TERMINATION_TIMEOUT;
        let mut guard = self.idle_lock.lock();
        while self.active_workers.load(Ordering::Acquire) > 0 {
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!("fork-join engine stop timed out waiting for workers");
                break;
            }
            self.idle_cvar.wait_for(&mut guard, deadline - now);
        }
    }

    fn is_paused(&self) -> bool {
        self.core.is_paused()
    }

    fn is_stopped(&self) -> bool {
        self.core.is_stopped()
    }
}

impl<T> Drop for ForkJoinEngine<T> {
    fn drop(&mut self) {
        self.core.begin_stop();
        for handle in self.handles.get_mut().drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingAction(Arc<AtomicUsize>);
    impl Action<()> for CountingAction {
        fn perform(&self, _ctx: &ActionContext<()>) -> JalseResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn periodic_runs_several_times_then_stops_after_cancel() {
        let engine = ForkJoinEngine::new(2);
        let count = Arc::new(AtomicUsize::new(0));
        let ctx = engine.new_context(Arc::new(CountingAction(Arc::clone(&count))));
        ctx.set_period(Duration::from_millis(50));
        ctx.schedule().unwrap();

        std::thread::sleep(Duration::from_millis(175));
        ctx.cancel();
        let seen_at_cancel = count.load(Ordering::SeqCst);
        assert!((3..=4).contains(&seen_at_cancel), "got {seen_at_cancel}");

        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(count.load(Ordering::SeqCst), seen_at_cancel);
        assert!(ctx.is_done());
        assert!(ctx.is_cancelled());
    }
}
