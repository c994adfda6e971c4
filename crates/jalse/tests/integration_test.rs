//! End-to-end scenarios spanning the action engine and the entity tree
//! together, one per scenario rather than scattered across unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use jalse::{
    Action, ActionContext, ActionEngine, Entity, EntityContainer, EntityFactory, EntityListener,
    Identifier, JalseError, JalseResult, ManualEngine,
};

fn manual_world() -> EntityContainer {
    let engine: Arc<dyn ActionEngine<Weak<Entity>>> = Arc::new(ManualEngine::new());
    EntityContainer::new_root(EntityFactory::unbounded(engine))
}

struct CountingAction(Arc<AtomicUsize>);

impl Action<()> for CountingAction {
    fn perform(&self, _ctx: &ActionContext<()>) -> JalseResult<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn one_shot_action_runs_exactly_once() {
    let engine = ManualEngine::<()>::new();
    let count = Arc::new(AtomicUsize::new(0));
    let ctx = engine
        .schedule(Arc::new(CountingAction(Arc::clone(&count))), None)
        .unwrap();
    engine.resume().unwrap();
    engine.resume().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(ctx.is_done());
    assert!(!ctx.is_cancelled());
}

#[test]
fn periodic_action_stops_firing_after_cancel() {
    let engine = ManualEngine::<()>::new();
    let count = Arc::new(AtomicUsize::new(0));
    let ctx = engine.new_context(Arc::new(CountingAction(Arc::clone(&count))));
    ctx.set_period(Duration::ZERO);
    ctx.schedule().unwrap();

    engine.resume().unwrap();
    engine.resume().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2);

    ctx.cancel();
    engine.resume().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(ctx.is_done());
    assert!(ctx.is_cancelled());
}

#[test]
fn cross_tree_transfer_fires_received_and_rebinds_engine() {
    let tree_a = manual_world();
    let tree_b = manual_world();

    #[derive(Default)]
    struct Counter {
        received: AtomicUsize,
        transferred: AtomicUsize,
    }
    impl EntityListener for Counter {
        fn entity_received(&self, _container: Identifier, _entity: &Arc<Entity>) {
            self.received.fetch_add(1, Ordering::SeqCst);
        }
        fn entity_transferred(
            &self,
            _source: Identifier,
            _destination: Identifier,
            _entity: &Arc<Entity>,
        ) {
            self.transferred.fetch_add(1, Ordering::SeqCst);
        }
    }
    let counter = Arc::new(Counter::default());
    tree_a.add_listener(counter.clone());
    tree_b.add_listener(counter.clone());

    let entity = tree_a.new_entity(Identifier::new_v4()).unwrap();
    tree_a.transfer_entity(entity.id(), &tree_b).unwrap();

    assert!(tree_b.has_entity(entity.id()));
    assert!(!tree_a.has_entity(entity.id()));
    assert_eq!(counter.received.load(Ordering::SeqCst), 1);
    // Cross-tree import fires entityReceived, never entityTransferred: that
    // event belongs to same-tree moves only.
    assert_eq!(counter.transferred.load(Ordering::SeqCst), 0);
}

#[test]
fn kill_cascades_through_every_descendant() {
    let world = manual_world();
    let parent = world.new_entity(Identifier::new_v4()).unwrap();
    let child = parent.children().new_entity(Identifier::new_v4()).unwrap();
    let grandchild = child.children().new_entity(Identifier::new_v4()).unwrap();

    assert!(parent.kill().is_ok());

    assert!(!parent.is_alive());
    assert!(!child.is_alive());
    assert!(!grandchild.is_alive());
    assert!(!world.has_entity(parent.id()));
}

#[test]
fn type_mark_inheritance_follows_registered_ancestors() {
    struct Animal;
    struct Bird;

    jalse::entity::global_type_registry().register_ancestor::<Bird, Animal>();

    let world = manual_world();
    let entity = world.new_entity_typed::<Bird>(Identifier::new_v4()).unwrap();

    assert!(entity.is_marked_as_type::<Bird>());
    assert!(entity.is_marked_as_type::<Animal>());

    assert!(entity.unmark_as_type::<Animal>().unwrap());
    assert!(!entity.is_marked_as_type::<Bird>());
}

#[test]
fn factory_cap_rejects_once_the_limit_is_reached() {
    let engine: Arc<dyn ActionEngine<Weak<Entity>>> = Arc::new(ManualEngine::new());
    let world = EntityContainer::new_root(EntityFactory::with_limit(2, engine));

    world.new_entity(Identifier::new_v4()).unwrap();
    world.new_entity(Identifier::new_v4()).unwrap();

    assert!(matches!(
        world.new_entity(Identifier::new_v4()),
        Err(JalseError::EntityLimitReached)
    ));
}
