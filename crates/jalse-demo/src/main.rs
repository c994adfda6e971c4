//! # jalse-demo
//!
//! Spawns a handful of wanderers on a shared map, lets them move for a
//! little while, then reports where each one ended up.

use std::time::Duration;

use jalse::Identifier;
use jalse_demo::lifecycle::{setup_tracing, World};
use jalse_demo::wanderer::{spawn_wanderer, Position, Wanderer};
use tracing::info;

fn main() {
    setup_tracing();

    let world = World::new(2);
    info!("spawning wanderers");

    let wanderers: Vec<_> = (1..=4)
        .map(|step| {
            spawn_wanderer(&world.map, step, Duration::from_millis(20))
                .expect("map is unbounded, spawn cannot fail here")
        })
        .collect();
    for entity in &wanderers {
        assert!(entity.is_marked_as_type::<Wanderer>());
    }

    std::thread::sleep(Duration::from_millis(150));

    // Move the first wanderer into a pen nested under the second, then let
    // the rest keep wandering on the shared map.
    let pen = wanderers[1].children();
    wanderers[0]
        .transfer(pen)
        .expect("transfer into a sibling's pen should succeed");
    info!(entity = %wanderers[0].id(), "moved into the pen");

    std::thread::sleep(Duration::from_millis(150));

    wanderers[3].kill().expect("kill should succeed while alive");
    info!(entity = %wanderers[3].id(), "culled");

    for entity in &wanderers {
        if !entity.is_alive() {
            info!(entity = %entity.id(), "no longer alive");
            continue;
        }
        let position = entity
            .attributes()
            .get::<Position>("position")
            .map(|p| *p)
            .unwrap_or(Position { x: 0, y: 0 });
        let parent: Option<Identifier> = entity.tags().parent_id;
        info!(entity = %entity.id(), x = position.x, y = position.y, ?parent, "final position");
    }

    world.shutdown();
    info!("done");
}
