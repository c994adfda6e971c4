//! # ActionScheduler
//!
//! Wraps one actor and one engine, retaining weak references to the
//! contexts it has scheduled so they can all be cancelled at once when the
//! actor dies or switches engine. Retention is weak so naturally-completed
//! contexts drop out without explicit pruning by the caller.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::error::JalseResult;

use super::context::{Action, ActionContext};
use super::engine::ActionEngine;

pub struct ActionScheduler<T: Clone + Send + Sync + 'static> {
    actor: T,
    engine: RwLock<Arc<dyn ActionEngine<T>>>,
    retained: Mutex<Vec<Weak<ActionContext<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> ActionScheduler<T> {
    pub fn new(actor: T, engine: Arc<dyn ActionEngine<T>>) -> Self {
        Self {
            actor,
            engine: RwLock::new(engine),
            retained: Mutex::new(Vec::new()),
        }
    }

    pub fn actor(&self) -> &T {
        &self.actor
    }

    fn prune(&self) {
        self.retained.lock().retain(|ctx| ctx.upgrade().is_some());
    }

    /// Creates a context bound to this actor without scheduling it.
    pub fn new_context_for_actor(&self, action: Arc<dyn Action<T>>) -> Arc<ActionContext<T>> {
        let ctx = self.engine.read().new_context(action);
        ctx.set_actor(Some(self.actor.clone()));
        self.prune();
        self.retained.lock().push(Arc::downgrade(&ctx));
        ctx
    }

    /// Creates, binds, times, and schedules a context in one call, retaining
    /// a weak reference to it.
    pub fn schedule_for_actor(
        &self,
        action: Arc<dyn Action<T>>,
        initial_delay: Duration,
        period: Duration,
    ) -> JalseResult<Arc<ActionContext<T>>> {
        let ctx = self.new_context_for_actor(action);
        ctx.set_initial_delay(initial_delay);
        ctx.set_period(period);
        ctx.schedule()?;
        Ok(ctx)
    }

    /// Cancels every retained context that is not already done, then clears
    /// the retained set.
    pub fn cancel_all_scheduled_for_actor(&self) {
        let retained = std::mem::take(&mut *self.retained.lock());
        for weak in retained {
            if let Some(ctx) = weak.upgrade() {
                ctx.cancel();
            }
        }
    }

    /// Replaces the engine. Previously retained references are dropped
    /// without being cancelled: the caller is abandoning those schedules,
    /// not tearing them down.
    pub fn set_engine(&self, engine: Arc<dyn ActionEngine<T>>) {
        *self.engine.write() = engine;
        self.retained.lock().clear();
    }
}
