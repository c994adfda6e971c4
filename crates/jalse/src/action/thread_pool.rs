//! # Fixed-rate thread-pool engine
//!
//! A pool of a configured size whose periodic contexts advance on a fixed
//! rate: `estimated += period` after each perform, rather than re-anchoring
//! to `now + period`. This lets the pool catch up after a late perform
//! instead of drifting the whole series later, mirroring a scheduled
//! executor's `scheduleAtFixedRate`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::error::{JalseError, JalseResult};

use super::context::{Action, ActionContext, Periodicity};
use super::engine::{ActionEngine, DEFAULT_TERMINATION_TIMEOUT};
use super::engine_core::{run_worker_loop, EngineCore};

pub struct ThreadPoolEngine<T> {
    core: Arc<EngineCore<T>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    active_workers: Arc<AtomicUsize>,
    idle_cvar: Arc<Condvar>,
    idle_lock: Arc<Mutex<()>>,
}

impl<T: Clone + Send + Sync + 'static> ThreadPoolEngine<T> {
    pub fn new(pool_size: usize) -> Self {
        let core = EngineCore::new();
        let active_workers = Arc::new(AtomicUsize::new(pool_size));
        let idle_cvar = Arc::new(Condvar::new());
        let idle_lock = Arc::new(Mutex::new(()));

        let mut handles = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let core = Arc::clone(&core);
            let active = Arc::clone(&active_workers);
            let idle_cvar = Arc::clone(&idle_cvar);
            let idle_lock = Arc::clone(&idle_lock);
            handles.push(std::thread::spawn(move || {
                run_worker_loop(core, Periodicity::FixedRate);
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
}

impl<T: Clone + Send + Sync + 'static> ActionEngine<T> for ThreadPoolEngine<T> {
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
                tracing::warn!("thread-pool engine stop timed out waiting for workers");
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

impl<T> Drop for ThreadPoolEngine<T> {
    fn drop(&mut self) {
        self.core.begin_stop();
        for handle in self.handles.get_mut().drain(..) {
            let _ = handle.join();
        }
    }
}
