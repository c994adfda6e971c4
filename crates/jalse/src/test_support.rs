//! # Test support
//!
//! Recording listeners for asserting event ordering and counts without
//! standing up real engine threads or a tokio runtime. Pair these with
//! [`crate::action::ManualEngine`], which dispatches synchronously inside
//! `resume()`, to keep tests deterministic.

use std::sync::Mutex;

use crate::entity::{AttributeEvent, AttributeListener, Entity, EntityListener};
use crate::Identifier;

/// What happened, in the order it happened, recorded by [`RecordingEntityListener`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    Created(Identifier),
    Killed(Identifier),
    Received(Identifier),
    Transferred { source: Identifier, destination: Identifier, entity: Identifier },
}

#[derive(Default)]
pub struct RecordingEntityListener {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEntityListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EntityListener for RecordingEntityListener {
    fn entity_created(&self, _container: Identifier, entity: &std::sync::Arc<Entity>) {
        self.events.lock().unwrap().push(RecordedEvent::Created(entity.id()));
    }

    fn entity_killed(&self, _container: Identifier, entity: &std::sync::Arc<Entity>) {
        self.events.lock().unwrap().push(RecordedEvent::Killed(entity.id()));
    }

    fn entity_received(&self, _container: Identifier, entity: &std::sync::Arc<Entity>) {
        self.events.lock().unwrap().push(RecordedEvent::Received(entity.id()));
    }

    fn entity_transferred(&self, source: Identifier, destination: Identifier, entity: &std::sync::Arc<Entity>) {
        self.events.lock().unwrap().push(RecordedEvent::Transferred {
            source,
            destination,
            entity: entity.id(),
        });
    }
}

/// What happened, in the order it happened, recorded by
/// [`RecordingAttributeListener`]. Carries only the name, since `V` is
/// already fixed by the listener's type parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedAttributeEvent {
    Added(String),
    Changed(String),
    Removed(String),
}

#[derive(Default)]
pub struct RecordingAttributeListener<V> {
    events: Mutex<Vec<RecordedAttributeEvent>>,
    _marker: std::marker::PhantomData<fn() -> V>,
}

impl<V> RecordingAttributeListener<V> {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn events(&self) -> Vec<RecordedAttributeEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl<V: Send + Sync> AttributeListener<V> for RecordingAttributeListener<V> {
    fn added(&self, event: &AttributeEvent<V>) {
        self.events.lock().unwrap().push(RecordedAttributeEvent::Added(event.name.clone()));
    }

    fn changed(&self, event: &AttributeEvent<V>) {
        self.events.lock().unwrap().push(RecordedAttributeEvent::Changed(event.name.clone()));
    }

    fn removed(&self, event: &AttributeEvent<V>) {
        self.events.lock().unwrap().push(RecordedAttributeEvent::Removed(event.name.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ManualEngine;
    use crate::entity::EntityContainer;
    use crate::entity::EntityFactory;
    use std::sync::{Arc, Weak};

    #[test]
    fn records_creation_in_order() {
        let engine: Arc<dyn crate::ActionEngine<Weak<Entity>>> = Arc::new(ManualEngine::new());
        let world = EntityContainer::new_root(EntityFactory::unbounded(engine));
        let listener = Arc::new(RecordingEntityListener::new());
        world.add_listener(listener.clone());

        let a = world.new_entity(Identifier::new_v4()).unwrap();
        let b = world.new_entity(Identifier::new_v4()).unwrap();

        assert_eq!(
            listener.events(),
            vec![RecordedEvent::Created(a.id()), RecordedEvent::Created(b.id())]
        );
    }

    #[test]
    fn records_attribute_events_in_order() {
        let engine: Arc<dyn crate::ActionEngine<Weak<Entity>>> = Arc::new(ManualEngine::new());
        let world = EntityContainer::new_root(EntityFactory::unbounded(engine));
        let entity = world.new_entity(Identifier::new_v4()).unwrap();
        let listener = Arc::new(RecordingAttributeListener::<f64>::new());
        entity.attributes().add_attribute_listener("speed", listener.clone());

        entity.attributes().set("speed", 1.0).unwrap();
        entity.attributes().set("speed", 2.0).unwrap();
        entity.attributes().remove::<f64>("speed").unwrap();

        assert_eq!(
            listener.events(),
            vec![
                RecordedAttributeEvent::Added("speed".to_string()),
                RecordedAttributeEvent::Changed("speed".to_string()),
                RecordedAttributeEvent::Removed("speed".to_string()),
            ]
        );
    }
}
