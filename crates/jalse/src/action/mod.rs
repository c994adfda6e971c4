//! # Action engine
//!
//! A scheduler that owns work contexts, dispatches them at their estimated
//! execution time, enforces cancellation and periodic re-scheduling, and
//! exposes three execution backings behind one [`ActionEngine`] contract:
//!
//! - [`manual::ManualEngine`] — no background thread; dispatch happens
//!   inline inside `resume()`.
//! - [`fork_join::ForkJoinEngine`] — a worker-thread pool, elapsed-time
//!   periodicity.
//! - [`thread_pool::ThreadPoolEngine`] — a worker-thread pool, fixed-rate
//!   periodicity.
//!
//! [`scheduler::ActionScheduler`] sits one layer up, tracking everything one
//! actor has scheduled on one engine so it can be mass-cancelled.

mod context;
pub mod detached;
mod engine;
mod engine_core;
pub mod fork_join;
pub mod manual;
mod queue;
pub mod scheduler;
pub mod thread_pool;

pub use context::{Action, ActionContext};
pub use detached::DetachedEngine;
pub use engine::{ActionEngine, DEFAULT_SPIN_YIELD_THRESHOLD, DEFAULT_TERMINATION_TIMEOUT};
pub use fork_join::ForkJoinEngine;
pub use manual::ManualEngine;
pub use scheduler::ActionScheduler;
pub use thread_pool::ThreadPoolEngine;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::bindings::Bindings;
use crate::error::JalseResult;
use parking_lot::Mutex;

/// A process-wide shared fork-join engine. Its `pause` and `stop` are
/// no-ops: callers cannot tear down the common engine, only their own.
pub struct CommonEngine<T>(ForkJoinEngine<T>);

impl<T: Clone + Send + Sync + 'static> ActionEngine<T> for CommonEngine<T> {
    fn bindings(&self) -> &Bindings {
        self.0.bindings()
    }

    fn new_context(&self, action: Arc<dyn Action<T>>) -> Arc<ActionContext<T>> {
        self.0.new_context(action)
    }

    fn schedule(
        &self,
        action: Arc<dyn Action<T>>,
        actor: Option<T>,
    ) -> JalseResult<Arc<ActionContext<T>>> {
        self.0.schedule(action, actor)
    }

    fn pause(&self) {}

    fn resume(&self) -> JalseResult<()> {
        Ok(())
    }

    fn stop(&self) {}

    fn is_paused(&self) -> bool {
        false
    }

    fn is_stopped(&self) -> bool {
        false
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

static COMMON_ENGINES: OnceLock<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    OnceLock::new();

/// Returns the process-wide common engine for actor type `T`, creating it on
/// first use. One instance per `T` lives for the life of the process.
pub fn common_engine<T: Clone + Send + Sync + 'static>() -> Arc<CommonEngine<T>> {
    let registry = COMMON_ENGINES.get_or_init(|| Mutex::new(HashMap::new()));
    let mut map = registry.lock();
    let type_id = TypeId::of::<T>();
    if let Some(existing) = map.get(&type_id) {
        return Arc::clone(existing)
            .downcast::<CommonEngine<T>>()
            .expect("common engine registry keyed by TypeId");
    }
    let engine: Arc<CommonEngine<T>> =
        Arc::new(CommonEngine(ForkJoinEngine::new(default_parallelism())));
    map.insert(type_id, engine.clone() as Arc<dyn Any + Send + Sync>);
    engine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_engine_pause_and_stop_are_no_ops() {
        let engine = common_engine::<()>();
        engine.pause();
        engine.stop();
        assert!(!engine.is_paused());
        assert!(!engine.is_stopped());
    }

    #[test]
    fn common_engine_is_a_singleton_per_type() {
        let a = common_engine::<u8>();
        let b = common_engine::<u8>();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
