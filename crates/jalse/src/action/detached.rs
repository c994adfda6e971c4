//! # Detached engine
//!
//! A null-object [`ActionEngine`] bound to exported entities: every
//! scheduling call fails with [`JalseError::EngineStopped`] until the entity
//! is re-imported onto a real engine.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::bindings::Bindings;
use crate::error::{JalseError, JalseResult};

use super::context::{Action, ActionContext};
use super::engine::ActionEngine;

pub struct DetachedEngine<T> {
    bindings: Bindings,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DetachedEngine<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            bindings: Bindings::new(),
            _marker: PhantomData,
        })
    }
}

impl<T: Clone + Send + Sync + 'static> ActionEngine<T> for DetachedEngine<T> {
    fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    fn new_context(&self, _action: Arc<dyn Action<T>>) -> Arc<ActionContext<T>> {
        ActionContext::new(std::sync::Weak::new(), _action, &self.bindings)
    }

    fn schedule(
        &self,
        _action: Arc<dyn Action<T>>,
        _actor: Option<T>,
    ) -> JalseResult<Arc<ActionContext<T>>> {
        Err(JalseError::EngineStopped)
    }

    fn pause(&self) {}

    fn resume(&self) -> JalseResult<()> {
        Err(JalseError::EngineStopped)
    }

    fn stop(&self) {}

    fn is_paused(&self) -> bool {
        false
    }

    fn is_stopped(&self) -> bool {
        true
    }
}
