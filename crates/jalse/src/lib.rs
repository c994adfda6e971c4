//! # jalse
//!
//! A tick-driven, agent-style simulation framework built from two
//! cooperating subsystems:
//!
//! 1. **Action engine** ([`action`]) — [`Bindings`], [`ActionContext`] /
//!    [`Action`], a time-ordered work queue, and three [`ActionEngine`]
//!    backings (manual, fork-join, thread-pool) sharing one dispatch
//!    contract. [`ActionScheduler`] tracks everything one actor has
//!    scheduled so it can be torn down as a unit.
//! 2. **Entity container tree** ([`entity`]) — [`Entity`] nodes composing an
//!    [`AttributeContainer`], a child [`EntityContainer`], and their own
//!    [`ActionScheduler`], created and torn down through one authoritative
//!    [`EntityFactory`] per tree.
//!
//! ## Concurrency
//!
//! Every shared structure here is locked with [`parking_lot`] primitives and
//! driven by real OS threads ([`std::thread::spawn`]), not an async runtime:
//! the simulation loop is a clock, not a reactor. [`Identifier`] values are
//! version-4 UUIDs.
//!
//! ## Errors
//!
//! All fallible operations return [`JalseResult`], built on the
//! [`JalseError`] enum via [`thiserror`].
//!
//! ## Testing
//!
//! [`test_support`] provides recording listeners for asserting event
//! ordering without standing up real engine threads.

pub mod action;
pub mod bindings;
pub mod entity;
pub mod error;
pub mod test_support;

pub use action::{
    Action, ActionContext, ActionEngine, ActionScheduler, DetachedEngine, ForkJoinEngine,
    ManualEngine, ThreadPoolEngine,
};
pub use bindings::Bindings;
pub use entity::{
    AttributeContainer, AttributeEvent, AttributeListener, Entity, EntityContainer,
    EntityFactory, EntityListener, Tags, TypeMarkListener,
};
pub use error::{JalseError, JalseResult};

/// A process-wide unique identity, assigned once at creation and never
/// reused.
pub type Identifier = uuid::Uuid;
