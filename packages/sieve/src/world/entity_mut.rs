use uuid::Uuid;

use crate::bits::BitVector;
use crate::component::Component;
use crate::entity::Entity;
use crate::error::Result;
use crate::world::World;

/// A live entity together with mutable access to its world.
///
/// This is the convenient way to assemble an entity:
///
/// ```ignore
/// let ship = world.create_entity();
/// world.entity_mut(ship)?
///     .with(Position::default())?
///     .with(Velocity::default())?
///     .add_to_world();
/// ```
pub struct EntityMut<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl<'w> EntityMut<'w> {
    pub(crate) fn new(world: &'w mut World, entity: Entity) -> EntityMut<'w> {
        EntityMut {
            world,
            entity,
        }
    }

    /// Return the handle of this entity.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Return the id of this entity.
    pub fn id(&self) -> usize {
        self.entity.id()
    }

    /// Return the identity of this incarnation of the entity.
    pub fn uuid(&self) -> Uuid {
        self.entity.uuid()
    }

    /// Return the debug name given at creation, if any.
    pub fn name(&self) -> Option<&str> {
        self.world.entities.record(self.entity).and_then(|r| r.name())
    }

    /// Return the component bits of this entity.
    pub fn component_bits(&self) -> Option<&BitVector> {
        self.world.entities.record(self.entity).map(|r| r.component_bits())
    }

    /// Return the system bits of this entity.
    pub fn system_bits(&self) -> Option<&BitVector> {
        self.world.entities.record(self.entity).map(|r| r.system_bits())
    }

    /// Create a `T` on this entity, see `World::create_component`.
    pub fn create_component<T: Component + Default>(&mut self) -> Result<&mut T> {
        self.world.create_component::<T>(self.entity)
    }

    /// Attach `component` to this entity.
    pub fn add_component<T: Component>(&mut self, component: T) -> Result<&mut Self> {
        self.world.add_component(self.entity, component)?;
        Ok(self)
    }

    /// Attach `component` to this entity, builder style.
    pub fn with<T: Component>(self, component: T) -> Result<Self> {
        self.world.add_component(self.entity, component)?;
        Ok(self)
    }

    /// Detach the `T` held by this entity.
    pub fn remove_component<T: Component>(&mut self) -> Result<bool> {
        self.world.remove_component::<T>(self.entity)
    }

    /// Get the `T` held by this entity.
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.world.component::<T>(self.entity)
    }

    /// Mutably get the `T` held by this entity.
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.world.component_mut::<T>(self.entity)
    }

    /// Returns true if this entity holds a `T`.
    pub fn has<T: Component>(&self) -> bool {
        self.world.has_component::<T>(self.entity)
    }

    /// Queue this entity to be added to the world.
    pub fn add_to_world(&mut self) {
        self.world.add_entity(self.entity);
    }

    /// Queue a change notification for this entity.
    pub fn changed_in_world(&mut self) {
        self.world.changed_entity(self.entity);
    }

    /// Queue this entity for deletion.
    pub fn delete_from_world(&mut self) {
        self.world.delete_entity(self.entity);
    }

    /// Queue this entity to be enabled.
    pub fn enable(&mut self) {
        self.world.enable(self.entity);
    }

    /// Queue this entity to be disabled.
    pub fn disable(&mut self) {
        self.world.disable(self.entity);
    }

    /// Returns true if this entity has been added and not deleted.
    pub fn is_active(&self) -> bool {
        self.world.is_active(self.entity)
    }

    /// Returns true unless this entity has been disabled.
    pub fn is_enabled(&self) -> bool {
        self.world.is_enabled(self.entity)
    }

    /// Return the world this entity lives in.
    pub fn world(&mut self) -> &mut World {
        self.world
    }
}
