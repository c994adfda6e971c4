//! # Wanderer
//!
//! A wanderer is an entity marked with the [`Wanderer`] type, holding a
//! `"position"` attribute and a periodic [`Wander`] action scheduled on
//! creation. Movement is deterministic (alternating direction by entity id
//! parity) so the demo's output is reproducible.

use std::sync::{Arc, Weak};
use std::time::Duration;

use jalse::{Action, ActionContext, Entity, EntityContainer, Identifier, JalseResult};

/// Type mark identifying an entity as a wanderer, for [`Entity::mark_as_type`].
pub struct Wanderer;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

pub struct Wander {
    pub step: i32,
}

impl Action<Weak<Entity>> for Wander {
    fn perform(&self, ctx: &ActionContext<Weak<Entity>>) -> JalseResult<()> {
        let entity = match ctx.actor().and_then(|weak| weak.upgrade()) {
            Some(entity) => entity,
            None => return Ok(()),
        };
        if !entity.is_alive() {
            return Ok(());
        }

        let current = entity
            .attributes()
            .get::<Position>("position")
            .map(|p| *p)
            .unwrap_or(Position { x: 0, y: 0 });

        let direction = if entity.id().as_u128() % 2 == 0 { self.step } else { -self.step };
        let next = Position {
            x: current.x + direction,
            y: current.y,
        };
        // The entity can die between the check above and here; losing that
        // race is not a perform failure, just a tick with nothing to do.
        if entity.attributes().set("position", next).is_err() {
            return Ok(());
        }
        tracing::debug!(entity = %entity.id(), x = next.x, y = next.y, "wandered");
        Ok(())
    }
}

/// Creates a wanderer in `map`, marks it, seeds its position, and schedules
/// its periodic move.
pub fn spawn_wanderer(map: &EntityContainer, step: i32, period: Duration) -> JalseResult<Arc<Entity>> {
    let entity = map.new_entity_typed::<Wanderer>(Identifier::new_v4())?;
    entity.attributes().set("position", Position { x: 0, y: 0 })?;
    entity
        .scheduler()
        .schedule_for_actor(Arc::new(Wander { step }), Duration::ZERO, period)?;
    Ok(entity)
}
