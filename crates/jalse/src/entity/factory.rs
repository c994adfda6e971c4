//! # EntityFactory
//!
//! The single authority for creating, killing, exporting, and importing
//! entities within one tree. Exactly one factory is shared by a root
//! container and every container nested under it, so membership (`live_ids`)
//! and the default engine new entities schedule on are tracked in one
//! place.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::action::{ActionEngine, DetachedEngine};
use crate::error::{JalseError, JalseResult};
use crate::Identifier;

use super::container::EntityContainer;
use super::entity::Entity;

pub struct EntityFactory {
    entity_limit: AtomicUsize,
    live_ids: RwLock<HashSet<Identifier>>,
    engine: RwLock<Arc<dyn ActionEngine<Weak<Entity>>>>,
}

impl EntityFactory {
    pub fn with_limit(entity_limit: usize, engine: Arc<dyn ActionEngine<Weak<Entity>>>) -> Arc<Self> {
        Arc::new(Self {
            entity_limit: AtomicUsize::new(entity_limit),
            live_ids: RwLock::new(HashSet::new()),
            engine: RwLock::new(engine),
        })
    }

    pub fn unbounded(engine: Arc<dyn ActionEngine<Weak<Entity>>>) -> Arc<Self> {
        Self::with_limit(usize::MAX, engine)
    }

    pub fn entity_limit(&self) -> usize {
        self.entity_limit.load(Ordering::Acquire)
    }

    pub fn set_entity_limit(&self, limit: usize) {
        self.entity_limit.store(limit, Ordering::Release);
    }

    pub fn live_count(&self) -> usize {
        self.live_ids.read().len()
    }

    pub fn is_live(&self, id: Identifier) -> bool {
        self.live_ids.read().contains(&id)
    }

    pub fn set_engine(&self, engine: Arc<dyn ActionEngine<Weak<Entity>>>) -> JalseResult<()> {
        if engine.is_stopped() {
            return Err(JalseError::EngineStopped);
        }
        *self.engine.write() = engine;
        Ok(())
    }

    pub(crate) fn new_entity(
        self: &Arc<Self>,
        id: Identifier,
        parent: &EntityContainer,
    ) -> JalseResult<Arc<Entity>> {
        {
            let live = self.live_ids.read();
            if live.len() >= self.entity_limit.load(Ordering::Acquire) {
                return Err(JalseError::EntityLimitReached);
            }
            if live.contains(&id) {
                return Err(JalseError::EntityAlreadyAssociated(id));
            }
        }
        let engine = self.engine.read().clone();
        let entity = Entity::new_with_id(id, Arc::clone(self), engine);
        entity.set_container(Some(parent.clone()));
        entity.mark_alive();
        self.live_ids.write().insert(id);
        Ok(entity)
    }

    /// Kills `entity` and, recursively, every descendant still alive under
    /// it. Returns `false` if `entity` was already dead or not tracked by
    /// this factory.
    pub(crate) fn try_kill_entity(&self, entity: &Arc<Entity>) -> bool {
        if !entity.is_alive() || !self.live_ids.read().contains(&entity.id()) {
            return false;
        }
        for child in entity.children().walk_entities() {
            child.mark_dead();
            child.scheduler().cancel_all_scheduled_for_actor();
            self.live_ids.write().remove(&child.id());
        }
        entity.mark_dead();
        entity.scheduler().cancel_all_scheduled_for_actor();
        entity.rebind_engine_recursive(DetachedEngine::new());
        entity.set_container(None);
        self.live_ids.write().remove(&entity.id());
        true
    }

    /// Re-parents `entity` within this same tree. No engine rebinding:
    /// one factory means one engine for the whole tree.
    pub(crate) fn try_take_from_tree(&self, entity: &Arc<Entity>, target: &EntityContainer) -> bool {
        if !self.live_ids.read().contains(&entity.id()) {
            return false;
        }
        entity.set_container(Some(target.clone()));
        true
    }

    /// Accepts an entity exported from a different tree: claims its id,
    /// rebinds it and every descendant onto this factory's engine, and
    /// re-parents it.
    pub(crate) fn try_import_entity(&self, entity: &Arc<Entity>, target: &EntityContainer) -> bool {
        let descendant_ids = entity.descendant_ids();
        {
            let mut live = self.live_ids.write();
            if live.len() + descendant_ids.len() >= self.entity_limit.load(Ordering::Acquire) {
                return false;
            }
            if live.contains(&entity.id()) {
                return false;
            }
            live.insert(entity.id());
            live.extend(descendant_ids);
        }
        let engine = self.engine.read().clone();
        entity.rebind_engine_recursive(engine);
        entity.set_container(Some(target.clone()));
        true
    }

    /// Detaches `entity` from this tree: cancels all scheduled work for it
    /// and its descendants, binds them to a placeholder engine that refuses
    /// further scheduling, and drops them from `live_ids`.
    pub(crate) fn export_entity(&self, entity: &Arc<Entity>) {
        entity.cancel_all_recursive();
        entity.rebind_engine_recursive(DetachedEngine::new());
        let mut live = self.live_ids.write();
        live.remove(&entity.id());
        for id in entity.descendant_ids() {
            live.remove(&id);
        }
        drop(live);
        entity.set_container(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ManualEngine;

    fn world(limit: usize) -> EntityContainer {
        let engine: Arc<dyn ActionEngine<Weak<Entity>>> = Arc::new(ManualEngine::new());
        EntityContainer::new_root(EntityFactory::with_limit(limit, engine))
    }

    #[test]
    fn limit_is_enforced() {
        let world = world(1);
        world.new_entity(Identifier::new_v4()).unwrap();
        assert!(matches!(
            world.new_entity(Identifier::new_v4()),
            Err(JalseError::EntityLimitReached)
        ));
    }

    #[test]
    fn cross_tree_transfer_rebinds_engine() {
        let world_a = world(10);
        let world_b = world(10);
        let entity = world_a.new_entity(Identifier::new_v4()).unwrap();
        world_a
            .transfer_entity(entity.id(), &world_b)
            .expect("cross-tree transfer should succeed");
        assert!(world_b.has_entity(entity.id()));
        assert!(!world_a.has_entity(entity.id()));
        assert!(entity.is_alive());
    }
}
