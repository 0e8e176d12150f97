use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

use crate::component::{Component, ComponentType};
use crate::entity::Entity;
use crate::world::World;

/// Fast typed access to one component type of one world.
///
/// Mappers are usually obtained by a system in its `initialize` hook and kept
/// for the lifetime of the world.
pub struct ComponentMapper<T> {
    component_type: ComponentType,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentMapper<T> {
    pub(crate) fn new(component_type: ComponentType) -> ComponentMapper<T> {
        ComponentMapper {
            component_type,
            _marker: PhantomData,
        }
    }

    /// Return the component type this mapper reads.
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    /// Get the `T` held by `entity`.
    pub fn get<'w>(&self, world: &'w World, entity: Entity) -> Option<&'w T> {
        if !world.is_alive(entity) {
            return None;
        }

        world.components.fetch(&self.component_type, entity.id())
            .and_then(|c| c.downcast_ref::<T>())
    }

    /// Mutably get the `T` held by `entity`.
    pub fn get_mut<'w>(&self, world: &'w mut World, entity: Entity) -> Option<&'w mut T> {
        if !world.is_alive(entity) {
            return None;
        }

        world.components.fetch_mut(&self.component_type, entity.id())
            .and_then(|c| c.downcast_mut::<T>())
    }

    /// Returns true if `entity` holds a `T`.
    pub fn has(&self, world: &World, entity: Entity) -> bool {
        self.get(world, entity).is_some()
    }
}

impl<T> Clone for ComponentMapper<T> {
    fn clone(&self) -> ComponentMapper<T> {
        *self
    }
}

impl<T> Copy for ComponentMapper<T> {}

impl<T> Debug for ComponentMapper<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentMapper({:?})", self.component_type)
    }
}
