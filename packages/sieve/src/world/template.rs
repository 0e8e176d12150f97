use std::any::Any;

use crate::entity::Entity;
use crate::error::Result;
use crate::world::World;

/// A named recipe for building entities.
///
/// Templates are registered on a world under a tag with
/// `World::register_template` and invoked with
/// `World::create_entity_from_template`, which hands them a freshly created,
/// bare entity. Closures of the right shape are templates too.
pub trait EntityTemplate: 'static {
    /// Fill in `entity`. `args` is whatever the caller passed through.
    fn build_entity(&self, entity: Entity, world: &mut World, args: &dyn Any) -> Result<Entity>;
}

impl<F> EntityTemplate for F
    where F: Fn(Entity, &mut World, &dyn Any) -> Result<Entity> + 'static
{
    fn build_entity(&self, entity: Entity, world: &mut World, args: &dyn Any) -> Result<Entity> {
        self(entity, world, args)
    }
}
