//! # System lifecycle
//!
//! Setup and teardown for the demo: tracing initialization and the
//! [`World`] that owns the shared map container, its factory, and the
//! engine every wanderer schedules on.

mod tracing_setup;
mod world;

pub use tracing_setup::setup_tracing;
pub use world::World;
