//! # Entity
//!
//! A node in the container tree: its own [`AttributeContainer`], its own
//! child [`EntityContainer`], its own [`ActionScheduler`] (scheduling with
//! `Weak<Entity>` as the actor, so a dead entity's contexts naturally stop
//! resolving an actor), a set of type marks, and [`Tags`] describing its
//! position in the tree. Built with [`Arc::new_cyclic`] so the child
//! container and the scheduler can each hold a `Weak<Entity>` back to their
//! owner without a reference cycle.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::action::{ActionEngine, ActionScheduler};
use crate::error::{JalseError, JalseResult};
use crate::Identifier;

use super::attributes::AttributeContainer;
use super::container::{ContainerInner, EntityContainer};
use super::factory::EntityFactory;
use super::tags::Tags;
use super::types::global_type_registry;

pub trait TypeMarkListener: Send + Sync {
    fn marked(&self, _entity: &Arc<Entity>, _mark: TypeId, _ancestors_added: &HashSet<TypeId>) {}
    fn unmarked(&self, _entity: &Arc<Entity>, _mark: TypeId, _descendants_removed: &HashSet<TypeId>) {}
}

pub struct Entity {
    id: Identifier,
    alive: Arc<AtomicBool>,
    container: RwLock<Option<Weak<ContainerInner>>>,
    children: EntityContainer,
    attributes: AttributeContainer,
    scheduler: ActionScheduler<Weak<Entity>>,
    marks: RwLock<HashSet<TypeId>>,
    type_listeners: RwLock<Vec<Arc<dyn TypeMarkListener>>>,
    tags: RwLock<Tags>,
}

impl Entity {
    pub(crate) fn new_with_id(
        id: Identifier,
        factory: Arc<EntityFactory>,
        engine: Arc<dyn ActionEngine<Weak<Entity>>>,
    ) -> Arc<Self> {
        let alive = Arc::new(AtomicBool::new(false));
        Arc::new_cyclic(|weak_self| Entity {
            id,
            alive: Arc::clone(&alive),
            container: RwLock::new(None),
            children: EntityContainer::new_owned(weak_self.clone(), id, factory),
            attributes: AttributeContainer::new(id, alive),
            scheduler: ActionScheduler::new(weak_self.clone(), engine),
            marks: RwLock::new(HashSet::new()),
            type_listeners: RwLock::new(Vec::new()),
            tags: RwLock::new(Tags::default()),
        })
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn require_alive(&self) -> JalseResult<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(JalseError::EntityNotAlive(self.id))
        }
    }

    pub(crate) fn mark_alive(&self) {
        self.alive.store(true, Ordering::Release);
    }

    pub(crate) fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn children(&self) -> &EntityContainer {
        &self.children
    }

    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    pub fn scheduler(&self) -> &ActionScheduler<Weak<Entity>> {
        &self.scheduler
    }

    pub fn tags(&self) -> Tags {
        self.tags.read().clone()
    }

    /// This entity's parent container, or `None` if it is detached (dead or
    /// exported without having been re-imported).
    pub fn get_container(&self) -> Option<EntityContainer> {
        self.container
            .read()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| EntityContainer::from_inner(inner))
    }

    pub(crate) fn set_container(&self, container: Option<EntityContainer>) {
        *self.container.write() = container.as_ref().map(|c| Arc::downgrade(c.inner_arc()));

        let mut tags = self.tags.write();
        match container.as_ref().and_then(|c| c.owner_entity()) {
            Some(owner) => {
                tags.parent_id = Some(owner.id());
                tags.tree_depth = owner.tags.read().tree_depth + 1;
            }
            None => {
                tags.parent_id = None;
                tags.tree_depth = 0;
            }
        }
        drop(tags);

        let root_id = self.get_container().map(|c| c.root().id());
        self.tags.write().root_container_id = root_id;
    }

    /// Fails if the entity is dead; a no-op (not an error) if `M` was
    /// already marked.
    pub fn mark_as_type<M: 'static>(self: &Arc<Self>) -> JalseResult<()> {
        self.mark_as_type_id(TypeId::of::<M>())
    }

    pub(crate) fn mark_as_type_id(self: &Arc<Self>, mark: TypeId) -> JalseResult<()> {
        self.require_alive()?;
        let registry = global_type_registry();
        let ancestors = registry.ancestors_of(mark);
        let mut added = HashSet::new();
        {
            let mut marks = self.marks.write();
            if !marks.insert(mark) {
                return Ok(());
            }
            for ancestor in ancestors {
                if marks.insert(ancestor) {
                    added.insert(ancestor);
                }
            }
        }
        for listener in self.type_listeners.read().iter() {
            listener.marked(self, mark, &added);
        }
        Ok(())
    }

    /// Removes `M` and, recursively, every marked type that counts `M`
    /// among its ancestors. Fails if the entity is dead; otherwise returns
    /// `false` if `M` was not marked.
    pub fn unmark_as_type<M: 'static>(self: &Arc<Self>) -> JalseResult<bool> {
        self.unmark_as_type_id(TypeId::of::<M>())
    }

    pub(crate) fn unmark_as_type_id(self: &Arc<Self>, mark: TypeId) -> JalseResult<bool> {
        self.require_alive()?;
        let registry = global_type_registry();
        let mut removed = HashSet::new();
        {
            let mut marks = self.marks.write();
            if !marks.remove(&mark) {
                return Ok(false);
            }
            for descendant in registry.descendants_of(mark) {
                if marks.remove(&descendant) {
                    removed.insert(descendant);
                }
            }
        }
        for listener in self.type_listeners.read().iter() {
            listener.unmarked(self, mark, &removed);
        }
        Ok(true)
    }

    /// True iff some currently-marked type is `M` or a subtype of `M`.
    pub fn is_marked_as_type<M: 'static>(&self) -> bool {
        self.is_marked_as_type_id(TypeId::of::<M>())
    }

    pub(crate) fn is_marked_as_type_id(&self, mark: TypeId) -> bool {
        let marks = self.marks.read();
        if marks.contains(&mark) {
            return true;
        }
        let registry = global_type_registry();
        marks.iter().any(|&m| registry.ancestors_of(m).contains(&mark))
    }

    pub fn marked_types(&self) -> HashSet<TypeId> {
        self.marks.read().clone()
    }

    pub fn add_type_mark_listener(&self, listener: Arc<dyn TypeMarkListener>) {
        self.type_listeners.write().push(listener);
    }

    pub fn transfer(self: &Arc<Self>, destination: &EntityContainer) -> JalseResult<()> {
        if Arc::ptr_eq(self.children.inner_arc(), destination.inner_arc()) {
            return Err(JalseError::CannotSelfTransfer);
        }
        let container = self.get_container().ok_or(JalseError::EntityNotAlive(self.id))?;
        container.transfer_entity(self.id, destination)
    }

    pub fn kill(self: &Arc<Self>) -> JalseResult<()> {
        let container = self.get_container().ok_or(JalseError::EntityNotAlive(self.id))?;
        if container.kill_entity(self.id) {
            Ok(())
        } else {
            Err(JalseError::EntityNotAlive(self.id))
        }
    }

    pub(crate) fn cancel_all_recursive(&self) {
        self.scheduler.cancel_all_scheduled_for_actor();
        for child in self.children.stream_entities() {
            child.cancel_all_recursive();
        }
    }

    pub(crate) fn rebind_engine_recursive(&self, engine: Arc<dyn ActionEngine<Weak<Entity>>>) {
        self.scheduler.set_engine(Arc::clone(&engine));
        for child in self.children.stream_entities() {
            child.rebind_engine_recursive(Arc::clone(&engine));
        }
    }

    pub(crate) fn descendant_ids(&self) -> Vec<Identifier> {
        self.children.walk_entities().map(|e| e.id()).collect()
    }
}
