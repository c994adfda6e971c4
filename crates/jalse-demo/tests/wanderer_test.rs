//! Drives the wanderer demo deterministically with a manual engine instead
//! of the fork-join one `World` uses, so position after N resumes is exact.

use std::sync::{Arc, Weak};
use std::time::Duration;

use jalse::{ActionEngine, Entity, EntityContainer, EntityFactory, ManualEngine};
use jalse_demo::wanderer::{spawn_wanderer, Position, Wanderer};

fn manual_map() -> (EntityContainer, Arc<ManualEngine<Weak<Entity>>>) {
    let engine = Arc::new(ManualEngine::new());
    let factory =
        EntityFactory::unbounded(Arc::clone(&engine) as Arc<dyn ActionEngine<Weak<Entity>>>);
    (EntityContainer::new_root(factory), engine)
}

#[test]
fn wanderer_moves_deterministically_by_id_parity() {
    let (map, engine) = manual_map();
    let wanderer = spawn_wanderer(&map, 3, Duration::from_nanos(1)).unwrap();
    assert!(wanderer.is_marked_as_type::<Wanderer>());

    let direction = if wanderer.id().as_u128() % 2 == 0 { 3 } else { -3 };

    for _ in 0..4 {
        engine.resume().unwrap();
    }

    let position = wanderer.attributes().get::<Position>("position").map(|p| *p).unwrap();
    assert_eq!(position, Position { x: direction * 4, y: 0 });
}

#[test]
fn transfer_into_a_pen_keeps_the_wanderer_alive_and_marked() {
    let (map, engine) = manual_map();
    let keeper = spawn_wanderer(&map, 1, Duration::ZERO).unwrap();
    let wanderer = spawn_wanderer(&map, 1, Duration::ZERO).unwrap();
    engine.resume().unwrap();

    wanderer.transfer(keeper.children()).unwrap();

    assert!(wanderer.is_alive());
    assert!(!map.has_entity(wanderer.id()));
    assert!(keeper.children().has_entity(wanderer.id()));
    assert_eq!(wanderer.tags().parent_id, Some(keeper.id()));
}

#[test]
fn killing_a_wanderer_removes_it_from_the_map() {
    let (map, _engine) = manual_map();
    let wanderer = spawn_wanderer(&map, 1, Duration::ZERO).unwrap();

    wanderer.kill().unwrap();

    assert!(!wanderer.is_alive());
    assert!(!map.has_entity(wanderer.id()));
}
