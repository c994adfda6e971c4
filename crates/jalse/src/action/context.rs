//! # ActionContext
//!
//! The per-schedule handle tracking one [`Action`]'s state on an engine:
//! its actor, timing, and the `done` / `cancelled` / `performing` flags that
//! make up its state machine (see the module docs on [`crate::action`]).

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::bindings::{BindingValue, Bindings};
use crate::error::{JalseError, JalseResult};
use crate::Identifier;

use super::engine_core::EngineCore;

/// A pure operation taking an [`ActionContext`]. May return a recoverable
/// error or [`JalseError::Cancellation`]; idempotence is not assumed.
pub trait Action<T>: Send + Sync {
    fn perform(&self, ctx: &ActionContext<T>) -> JalseResult<()>;
}

/// How a periodic context recomputes its next estimated fire time.
///
/// `Elapsed` (used by the manual and fork-join engines) re-anchors to
/// `now + period` after each perform returns. `FixedRate` (used by the
/// thread-pool engine) advances the previous estimate by exactly `period`,
/// which lets the engine catch up after a late perform instead of drifting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Periodicity {
    Elapsed,
    FixedRate,
}

pub(crate) struct ContextState<T> {
    actor: Option<T>,
    initial_delay: Duration,
    period: Duration,
    estimated: Instant,
    done: bool,
    cancelled: bool,
    performing: bool,
    periodic_on_exception: bool,
    queued: bool,
    generation: u64,
}

/// One scheduled [`Action`]'s handle: immutable identity plus the mutable
/// scheduling knobs described in the module contract.
pub struct ActionContext<T> {
    id: Identifier,
    engine: Weak<EngineCore<T>>,
    action: Arc<dyn Action<T>>,
    state: Mutex<ContextState<T>>,
    done_cvar: Condvar,
    bindings: Bindings,
}

impl<T: Clone + Send + Sync + 'static> ActionContext<T> {
    pub(crate) fn new(
        engine: Weak<EngineCore<T>>,
        action: Arc<dyn Action<T>>,
        source_bindings: &Bindings,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: Identifier::new_v4(),
            engine,
            action,
            state: Mutex::new(ContextState {
                actor: None,
                initial_delay: Duration::ZERO,
                period: Duration::ZERO,
                estimated: Instant::now(),
                done: false,
                cancelled: false,
                performing: false,
                periodic_on_exception: false,
                queued: false,
                generation: 0,
            }),
            done_cvar: Condvar::new(),
            bindings: source_bindings.shallow_copy(),
        })
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn action(&self) -> &Arc<dyn Action<T>> {
        &self.action
    }

    /// True while the owning engine is still alive and accepting work.
    pub fn engine_is_stopped(&self) -> bool {
        self.engine.upgrade().map_or(true, |core| core.is_stopped())
    }

    pub fn actor(&self) -> Option<T> {
        self.state.lock().actor.clone()
    }

    pub fn set_actor(&self, actor: Option<T>) {
        self.state.lock().actor = actor;
    }

    pub fn initial_delay(&self) -> Duration {
        self.state.lock().initial_delay
    }

    pub fn period(&self) -> Duration {
        self.state.lock().period
    }

    /// `Duration` is unsigned, so a negative delay is unrepresentable and the
    /// "rejects negative" invariant holds structurally rather than at runtime.
    pub fn set_initial_delay(&self, delay: Duration) {
        self.state.lock().initial_delay = delay;
    }

    pub fn set_period(&self, period: Duration) {
        self.state.lock().period = period;
    }

    pub fn set_periodic_on_exception(&self, value: bool) {
        self.state.lock().periodic_on_exception = value;
    }

    pub fn is_done(&self) -> bool {
        self.state.lock().done
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    pub fn is_performing(&self) -> bool {
        self.state.lock().performing
    }

    pub fn get(&self, key: &str) -> Option<BindingValue> {
        self.bindings.get(key)
    }

    pub fn put(&self, key: impl Into<String>, value: BindingValue) -> JalseResult<()> {
        self.bindings.put(key, value)
    }

    pub fn remove(&self, key: &str) -> Option<BindingValue> {
        self.bindings.remove(key)
    }

    /// Enqueues this context on its engine unless it is already done.
    pub fn schedule(self: &Arc<Self>) -> JalseResult<()> {
        if self.state.lock().done {
            return Ok(());
        }
        let engine = self.engine.upgrade().ok_or(JalseError::EngineStopped)?;
        if engine.is_stopped() {
            return Err(JalseError::EngineStopped);
        }
        {
            let mut state = self.state.lock();
            state.estimated = Instant::now() + state.initial_delay;
            state.generation += 1;
            state.queued = true;
        }
        engine.enqueue(Arc::clone(self))
    }

    /// Blocks the calling thread until this context is done.
    ///
    /// Not supported on a periodic context: there is no single terminal
    /// point to wait for, since it keeps re-entering `waiting`.
    pub fn await_done(&self) -> JalseResult<()> {
        let mut state = self.state.lock();
        if state.period > Duration::ZERO {
            return Err(JalseError::PeriodicAwaitUnsupported);
        }
        while !state.done {
            self.done_cvar.wait(&mut state);
        }
        if state.cancelled {
            return Err(JalseError::Cancellation);
        }
        Ok(())
    }

    pub fn schedule_and_await(self: &Arc<Self>) -> JalseResult<()> {
        if self.state.lock().period > Duration::ZERO {
            return Err(JalseError::PeriodicAwaitUnsupported);
        }
        self.schedule()?;
        self.await_done()
    }

    /// Marks the context done and cancelled. Idempotent: returns `false` if
    /// it was already done. Observers see `is_done() == true` before this
    /// call returns.
    pub fn cancel(self: &Arc<Self>) -> bool {
        let was_queued;
        {
            let mut state = self.state.lock();
            if state.done {
                return false;
            }
            state.done = true;
            state.cancelled = true;
            was_queued = state.queued;
            state.queued = false;
            state.generation += 1;
        }
        if was_queued {
            if let Some(engine) = self.engine.upgrade() {
                engine.notify();
            }
        }
        self.done_cvar.notify_all();
        true
    }

    pub(crate) fn estimated(&self) -> Instant {
        self.state.lock().estimated
    }

    pub(crate) fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Transitions `waiting -> performing` unless the context was cancelled
    /// or completed out from under the dispatcher between pop and perform.
    pub(crate) fn begin_perform(&self) -> bool {
        let mut state = self.state.lock();
        if state.done {
            return false;
        }
        state.performing = true;
        state.queued = false;
        true
    }

    /// Applies the result of one perform, re-queuing a periodic, non-cancelled
    /// context at its next estimated fire time. Returns the context to
    /// resubmit, if any.
    pub(crate) fn finish_perform(
        self: &Arc<Self>,
        result: JalseResult<()>,
        mode: Periodicity,
    ) -> Option<Arc<Self>> {
        let mut state = self.state.lock();
        state.performing = false;
        if state.cancelled {
            state.done = true;
            drop(state);
            self.done_cvar.notify_all();
            return None;
        }

        let reschedule = |state: &mut ContextState<T>| {
            state.estimated = match mode {
                Periodicity::Elapsed => Instant::now() + state.period,
                Periodicity::FixedRate => state.estimated + state.period,
            };
            state.generation += 1;
            state.queued = true;
        };

        match result {
            Ok(()) => {
                if state.period > Duration::ZERO {
                    reschedule(&mut state);
                    drop(state);
                    Some(Arc::clone(self))
                } else {
                    state.done = true;
                    drop(state);
                    self.done_cvar.notify_all();
                    None
                }
            }
            Err(JalseError::Cancellation) => {
                state.done = true;
                state.cancelled = true;
                drop(state);
                self.done_cvar.notify_all();
                None
            }
            Err(e) => {
                tracing::warn!(context = %self.id, error = %e, "action perform failed");
                if state.period > Duration::ZERO && state.periodic_on_exception {
                    reschedule(&mut state);
                    drop(state);
                    Some(Arc::clone(self))
                } else {
                    state.done = true;
                    drop(state);
                    self.done_cvar.notify_all();
                    None
                }
            }
        }
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
    fn cancel_is_idempotent_and_marks_done() {
        let core = EngineCore::<()>::new_detached();
        let ctx = ActionContext::new(
            Arc::downgrade(&core),
            Arc::new(CountingAction(Arc::new(AtomicUsize::new(0)))),
            &Bindings::new(),
        );
        assert!(ctx.cancel());
        assert!(ctx.is_done());
        assert!(ctx.is_cancelled());
        assert!(!ctx.cancel());
    }

    #[test]
    fn await_rejects_periodic_context() {
        let core = EngineCore::<()>::new_detached();
        let ctx = ActionContext::new(
            Arc::downgrade(&core),
            Arc::new(CountingAction(Arc::new(AtomicUsize::new(0)))),
            &Bindings::new(),
        );
        ctx.set_period(Duration::from_millis(10));
        assert!(matches!(
            ctx.await_done(),
            Err(JalseError::PeriodicAwaitUnsupported)
        ));
    }
}
