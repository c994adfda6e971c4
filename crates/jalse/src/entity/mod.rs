//! # Entity container tree
//!
//! A tree of [`Entity`] nodes, each composing an [`AttributeContainer`], a
//! child [`EntityContainer`], and its own [`ActionScheduler`][crate::ActionScheduler].
//! One [`EntityFactory`] per tree is the sole authority for creating,
//! killing, exporting, and importing entities, so membership and engine
//! binding stay consistent across every container in that tree.
//!
//! Type marks ([`Entity::mark_as_type`]) are resolved against a process-wide
//! [`TypeRegistry`](types::TypeRegistry), since Rust has no reflective way
//! to discover a type's declared ancestors at runtime.

mod attributes;
mod container;
mod entity;
mod factory;
mod tags;
mod types;

pub use attributes::{AttributeContainer, AttributeEvent, AttributeListener};
pub use container::{EntityContainer, EntityListener, EntityWalk};
pub use entity::{Entity, TypeMarkListener};
pub use factory::EntityFactory;
pub use tags::Tags;
pub use types::{global_type_registry, TypeRegistry};
