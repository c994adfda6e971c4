//! # jalse-demo
//!
//! A small worked example built on [`jalse`]: a shared map container holds a
//! handful of "wanderer" entities, each scheduling its own periodic move
//! action on a fork-join engine. It exercises the action engine, the entity
//! tree, attributes, and type marks together, end to end.

pub mod lifecycle;
pub mod wanderer;
