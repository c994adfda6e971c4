//! # Manual engine
//!
//! No background thread. All dispatch happens on the caller's thread inside
//! [`ManualEngine::resume`], which drains every context ready at the moment
//! it is called, in time order, then returns. `pause` is a no-op: the engine
//! is already quiescent between `resume` calls.

use std::sync::Arc;

use crate::error::JalseResult;

use super::context::{Action, ActionContext, Periodicity};
use super::engine::ActionEngine;
use super::engine_core::EngineCore;

pub struct ManualEngine<T> {
    core: Arc<EngineCore<T>>,
}

impl<T: Clone + Send + Sync + 'static> ManualEngine<T> {
    pub fn new() -> Self {
        Self {
            core: EngineCore::new(),
        }
    }

    /// Performs every context ready right now, oldest estimated time first.
    /// Periodic contexts that re-queue during this call are picked up on the
    /// next `resume`, not the current one, since readiness is snapshotted by
    /// `poll_ready` at each step against the live queue.
    fn drain_ready(&self) {
        while let Some(ctx) = self.core.queue.poll_ready() {
            if !ctx.begin_perform() {
                continue;
            }
            let result = ctx.action().perform(&ctx);
            if let Some(resubmit) = ctx.finish_perform(result, Periodicity::Elapsed) {
                self.core.queue.add(resubmit);
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for ManualEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> ActionEngine<T> for ManualEngine<T> {
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

    fn pause(&self) {}

    fn resume(&self) -> JalseResult<()> {
        if self.core.is_stopped() {
            return Err(crate::error::JalseError::EngineStopped);
        }
        self.drain_ready();
        Ok(())
    }

    fn stop(&self) {
        self.core.begin_stop();
    }

    fn is_paused(&self) -> bool {
        false
    }

    fn is_stopped(&self) -> bool {
        self.core.is_stopped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAction(Arc<AtomicUsize>);
    impl Action<()> for CountingAction {
        fn perform(&self, _ctx: &ActionContext<()>) -> JalseResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn one_shot_runs_once_on_resume() {
        let engine = ManualEngine::new();
        let count = Arc::new(AtomicUsize::new(0));
        let ctx = engine
            .schedule(Arc::new(CountingAction(Arc::clone(&count))), None)
            .unwrap();
        engine.resume().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(ctx.is_done());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn stop_rejects_further_scheduling() {
        let engine = ManualEngine::new();
        engine.stop();
        assert!(engine.is_stopped());
        let count = Arc::new(AtomicUsize::new(0));
        let err = engine.schedule(Arc::new(CountingAction(count)), None);
        assert!(matches!(err, Err(crate::error::JalseError::EngineStopped)));
    }
}
