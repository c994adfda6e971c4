//! # EntityContainer
//!
//! A `UUID -> Entity` map owned exclusively by whatever holds it: a root
//! "world" container owned by the caller, or a child container owned by one
//! [`Entity`] (see [`Entity::children`]). Children hold only a weak
//! back-reference to their container, so a container and its children never
//! form a reference cycle even though the container holds its children
//! strongly.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::{JalseError, JalseResult};
use crate::Identifier;

use super::entity::Entity;
use super::factory::EntityFactory;

pub trait EntityListener: Send + Sync {
    fn entity_created(&self, _container: Identifier, _entity: &Arc<Entity>) {}
    fn entity_killed(&self, _container: Identifier, _entity: &Arc<Entity>) {}
    fn entity_received(&self, _container: Identifier, _entity: &Arc<Entity>) {}
    fn entity_transferred(
        &self,
        _source: Identifier,
        _destination: Identifier,
        _entity: &Arc<Entity>,
    ) {
    }
}

pub(crate) struct ContainerInner {
    pub(crate) id: Identifier,
    pub(crate) children: RwLock<HashMap<Identifier, Arc<Entity>>>,
    listeners: RwLock<Vec<Arc<dyn EntityListener>>>,
    pub(crate) factory: Arc<EntityFactory>,
    owner: Option<Weak<Entity>>,
}

#[derive(Clone)]
pub struct EntityContainer {
    pub(crate) inner: Arc<ContainerInner>,
}

impl EntityContainer {
    /// A top-level container with no owning entity, e.g. a simulation's
    /// world.
    pub fn new_root(factory: Arc<EntityFactory>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                id: Identifier::new_v4(),
                children: RwLock::new(HashMap::new()),
                listeners: RwLock::new(Vec::new()),
                factory,
                owner: None,
            }),
        }
    }

    pub(crate) fn new_owned(owner: Weak<Entity>, id: Identifier, factory: Arc<EntityFactory>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                id,
                children: RwLock::new(HashMap::new()),
                listeners: RwLock::new(Vec::new()),
                factory,
                owner: Some(owner),
            }),
        }
    }

    pub fn id(&self) -> Identifier {
        self.inner.id
    }

    pub(crate) fn from_inner(inner: Arc<ContainerInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner_arc(&self) -> &Arc<ContainerInner> {
        &self.inner
    }

    pub(crate) fn owner_entity(&self) -> Option<Arc<Entity>> {
        self.inner.owner.as_ref().and_then(Weak::upgrade)
    }

    /// Walks up through owning entities to the top-level container of this
    /// tree.
    pub fn root(&self) -> EntityContainer {
        match self.owner_entity() {
            Some(owner) => match owner.get_container() {
                Some(parent) => parent.root(),
                None => self.clone(),
            },
            None => self.clone(),
        }
    }

    pub fn within_same_tree(&self, other: &EntityContainer) -> bool {
        Arc::ptr_eq(&self.root().inner, &other.root().inner)
    }

    /// Allocates and registers the entity but does not fire `entityCreated`,
    /// leaving room for a caller to finish setup (a type mark, copied
    /// attributes) before the event goes out.
    fn create_entity_unfired(&self, id: Identifier) -> JalseResult<Arc<Entity>> {
        if self.has_entity(id) {
            return Err(JalseError::EntityAlreadyAssociated(id));
        }
        let entity = self.inner.factory.new_entity(id, self)?;
        self.inner.children.write().insert(id, Arc::clone(&entity));
        Ok(entity)
    }

    pub fn new_entity(&self, id: Identifier) -> JalseResult<Arc<Entity>> {
        let entity = self.create_entity_unfired(id)?;
        self.fire_created(&entity);
        Ok(entity)
    }

    /// Marks the entity as `M` before firing `entityCreated`, so listeners
    /// never observe it without the mark.
    pub fn new_entity_typed<M: 'static>(&self, id: Identifier) -> JalseResult<Arc<Entity>> {
        let entity = self.create_entity_unfired(id)?;
        entity.mark_as_type::<M>()?;
        self.fire_created(&entity);
        Ok(entity)
    }

    /// Copies `source`'s attributes before firing `entityCreated`, so
    /// listeners never observe the entity with an empty attribute set.
    pub fn new_entity_with_source(
        &self,
        id: Identifier,
        source: &super::attributes::AttributeContainer,
    ) -> JalseResult<Arc<Entity>> {
        let entity = self.create_entity_unfired(id)?;
        entity.attributes().copy_from(source);
        self.fire_created(&entity);
        Ok(entity)
    }

    pub fn get_entity(&self, id: Identifier) -> Option<Arc<Entity>> {
        self.inner.children.read().get(&id).cloned()
    }

    pub fn has_entity(&self, id: Identifier) -> bool {
        self.inner.children.read().contains_key(&id)
    }

    pub fn entity_ids(&self) -> Vec<Identifier> {
        self.inner.children.read().keys().copied().collect()
    }

    /// The container's direct children.
    pub fn stream_entities(&self) -> Vec<Arc<Entity>> {
        self.inner.children.read().values().cloned().collect()
    }

    /// A lazy, breadth-first walk of this container's entire subtree. Never
    /// throws: iteration just ends when the frontier is exhausted.
    pub fn walk_entities(&self) -> EntityWalk {
        EntityWalk {
            frontier: self.stream_entities().into(),
        }
    }

    pub fn kill_entity(&self, id: Identifier) -> bool {
        let entity = match self.get_entity(id) {
            Some(entity) => entity,
            None => return false,
        };
        if self.inner.factory.try_kill_entity(&entity) {
            self.inner.children.write().remove(&id);
            self.fire_killed(&entity);
            true
        } else {
            false
        }
    }

    pub fn kill_entities(&self) {
        for id in self.entity_ids() {
            self.kill_entity(id);
        }
    }

    /// Takes `entity` into this container, removing it from whatever
    /// container currently holds it first so it is never briefly present in
    /// two maps at once. Tries an intra-tree move first (no event fired
    /// here; [`Self::transfer_entity`] fires `entityTransferred` for that
    /// case), then a cross-tree import (fires `entityReceived`).
    pub fn receive_entity(&self, entity: Arc<Entity>) -> JalseResult<()> {
        if self.has_entity(entity.id()) {
            return Err(JalseError::EntityAlreadyAssociated(entity.id()));
        }
        if let Some(owner) = self.owner_entity() {
            if owner.id() == entity.id() {
                return Err(JalseError::CannotSelfTransfer);
            }
        }
        let source = entity.get_container();

        if self.inner.factory.try_take_from_tree(&entity, self) {
            if let Some(source) = &source {
                source.inner.children.write().remove(&entity.id());
            }
            self.inner.children.write().insert(entity.id(), Arc::clone(&entity));
            return Ok(());
        }

        if let Some(source) = &source {
            source.inner.factory.export_entity(&entity);
            source.inner.children.write().remove(&entity.id());
        }
        if self.inner.factory.try_import_entity(&entity, self) {
            self.inner.children.write().insert(entity.id(), Arc::clone(&entity));
            self.fire_received(&entity);
            return Ok(());
        }
        if source.is_some() {
            return Err(JalseError::ExportedButNotTransferred);
        }
        Err(JalseError::EntityAlreadyAssociated(entity.id()))
    }

    pub fn transfer_entity(&self, id: Identifier, destination: &EntityContainer) -> JalseResult<()> {
        if Arc::ptr_eq(&self.inner, &destination.inner) {
            return Err(JalseError::CannotSelfTransfer);
        }
        let entity = self.get_entity(id).ok_or(JalseError::EntityNotAlive(id))?;
        let same_tree = self.within_same_tree(destination);

        destination.receive_entity(Arc::clone(&entity))?;

        if same_tree {
            self.fire_transferred(destination, &entity);
        }
        Ok(())
    }

    pub fn add_listener(&self, listener: Arc<dyn EntityListener>) {
        self.inner.listeners.write().push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn EntityListener>) {
        self.inner.listeners.write().retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn remove_all_listeners(&self) {
        self.inner.listeners.write().clear();
    }

    fn snapshot_listeners(&self) -> Vec<Arc<dyn EntityListener>> {
        self.inner.listeners.read().clone()
    }

    fn fire_created(&self, entity: &Arc<Entity>) {
        for listener in self.snapshot_listeners() {
            listener.entity_created(self.inner.id, entity);
        }
    }

    fn fire_killed(&self, entity: &Arc<Entity>) {
        for listener in self.snapshot_listeners() {
            listener.entity_killed(self.inner.id, entity);
        }
    }

    fn fire_received(&self, entity: &Arc<Entity>) {
        for listener in self.snapshot_listeners() {
            listener.entity_received(self.inner.id, entity);
        }
    }

    fn fire_transferred(&self, destination: &EntityContainer, entity: &Arc<Entity>) {
        for listener in self.snapshot_listeners() {
            listener.entity_transferred(self.inner.id, destination.inner.id, entity);
        }
    }
}

pub struct EntityWalk {
    frontier: VecDeque<Arc<Entity>>,
}

impl Iterator for EntityWalk {
    type Item = Arc<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.frontier.pop_front()?;
        for child in current.children().stream_entities() {
            self.frontier.push_back(child);
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ManualEngine;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn world() -> EntityContainer {
        let engine: Arc<dyn crate::ActionEngine<Weak<Entity>>> = Arc::new(ManualEngine::new());
        EntityContainer::new_root(EntityFactory::unbounded(engine))
    }

    #[test]
    fn new_entity_rejects_duplicate_id() {
        let world = world();
        let id = Identifier::new_v4();
        world.new_entity(id).unwrap();
        assert!(matches!(
            world.new_entity(id),
            Err(JalseError::EntityAlreadyAssociated(_))
        ));
    }

    #[test]
    fn kill_entity_cascades_to_children() {
        let world = world();
        let parent = world.new_entity(Identifier::new_v4()).unwrap();
        let child = parent.children().new_entity(Identifier::new_v4()).unwrap();
        assert!(world.kill_entity(parent.id()));
        assert!(!parent.is_alive());
        assert!(!child.is_alive());
    }

    #[test]
    fn transfer_within_same_tree_fires_once() {
        let world = world();
        let a = world.new_entity(Identifier::new_v4()).unwrap();
        let b = world.new_entity(Identifier::new_v4()).unwrap();
        let events = Arc::new(AtomicUsize::new(0));

        struct Counter(Arc<AtomicUsize>);
        impl EntityListener for Counter {
            fn entity_transferred(&self, _s: Identifier, _d: Identifier, _e: &Arc<Entity>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            fn entity_received(&self, _c: Identifier, _e: &Arc<Entity>) {
                self.0.fetch_add(100, Ordering::SeqCst);
            }
        }
        world.add_listener(Arc::new(Counter(events.clone())));

        let child_id = Identifier::new_v4();
        a.children().new_entity(child_id).unwrap();
        a.children().transfer_entity(child_id, b.children()).unwrap();

        assert_eq!(events.load(Ordering::SeqCst), 1);
        assert!(b.children().has_entity(child_id));
        assert!(!a.children().has_entity(child_id));
    }

    #[test]
    fn receive_entity_called_directly_removes_it_from_its_prior_container() {
        let world = world();
        let a = world.new_entity(Identifier::new_v4()).unwrap();
        let b = world.new_entity(Identifier::new_v4()).unwrap();
        let child_id = Identifier::new_v4();
        a.children().new_entity(child_id).unwrap();
        let entity = a.children().get_entity(child_id).unwrap();

        b.children().receive_entity(entity).unwrap();

        assert!(b.children().has_entity(child_id));
        assert!(!a.children().has_entity(child_id), "entity must not remain in its prior container");
    }

    #[test]
    fn cross_tree_transfer_fires_received_not_transferred() {
        let tree_a = world();
        let tree_b = world();
        let events = Arc::new(AtomicUsize::new(0));

        struct Counter(Arc<AtomicUsize>);
        impl EntityListener for Counter {
            fn entity_transferred(&self, _s: Identifier, _d: Identifier, _e: &Arc<Entity>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            fn entity_received(&self, _c: Identifier, _e: &Arc<Entity>) {
                self.0.fetch_add(100, Ordering::SeqCst);
            }
        }
        tree_a.add_listener(Arc::new(Counter(events.clone())));
        tree_b.add_listener(Arc::new(Counter(events.clone())));

        let entity = tree_a.new_entity(Identifier::new_v4()).unwrap();
        tree_a.transfer_entity(entity.id(), &tree_b).unwrap();

        assert_eq!(events.load(Ordering::SeqCst), 100);
        assert!(!tree_a.has_entity(entity.id()));
        assert!(tree_b.has_entity(entity.id()));
    }

    #[test]
    fn walk_entities_is_breadth_first() {
        let world = world();
        let a = world.new_entity(Identifier::new_v4()).unwrap();
        let b = a.children().new_entity(Identifier::new_v4()).unwrap();
        let _c = b.children().new_entity(Identifier::new_v4()).unwrap();
        let visited: Vec<Identifier> = world.walk_entities().map(|e| e.id()).collect();
        assert_eq!(visited.len(), 3);
        assert_eq!(visited[0], a.id());
    }
}
