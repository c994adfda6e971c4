//! The shared map: one fork-join engine, one factory, one root container.

use std::sync::{Arc, Weak};

use jalse::{ActionEngine, Entity, EntityContainer, EntityFactory, ForkJoinEngine};

pub struct World {
    pub map: EntityContainer,
    engine: Arc<ForkJoinEngine<Weak<Entity>>>,
}

impl World {
    pub fn new(worker_count: usize) -> Self {
        let engine = Arc::new(ForkJoinEngine::new(worker_count));
        let factory =
            EntityFactory::unbounded(Arc::clone(&engine) as Arc<dyn ActionEngine<Weak<Entity>>>);
        Self {
            map: EntityContainer::new_root(factory),
            engine,
        }
    }

    /// Stops the engine and waits (briefly) for workers to notice.
    pub fn shutdown(self) {
        self.engine.stop();
    }
}
