//! Systems: per-frame processors over the entities matching an aspect.
//!
//! A system only describes what it wants (`aspect`) and what it does. The
//! world wraps every registered system in a slot which owns its active set and
//! keeps it in step with the entities' component bits as lifecycle events are
//! flushed.

use std::any::TypeId;

use crate::aspect::{Aspect, AspectBuilder};
use crate::bag::IndexedBag;
use crate::component::AsAny;
use crate::entity::Entity;
use crate::error::Result;
use crate::manager::Notification;
use crate::world::World;

pub use delayed::{DelayedProcessor, DelayedSystem};
pub use interval::IntervalSystem;
pub use processing::{EntityProcessor, ProcessingSystem};
pub use void::{VoidProcessor, VoidSystem};

mod delayed;
mod interval;
mod processing;
mod void;

/// A per-frame processor of the entities matching an aspect.
///
/// Only `process_entities` is required. Everything else has a default
/// suitable for a system which processes its whole active set every frame.
pub trait EntitySystem: AsAny {
    /// Describe the entities this system is interested in.
    ///
    /// This is called once, when the system is registered. The default is the
    /// empty aspect, which matches no entity.
    fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect {
        builder.build()
    }

    /// Called once by `World::initialize`.
    fn initialize(&mut self, _world: &mut World) -> Result<()> {
        Ok(())
    }

    /// An entity started matching this system.
    fn inserted(&mut self, _world: &mut World, _entity: Entity) {}

    /// An entity stopped matching this system, was disabled or was deleted.
    fn removed(&mut self, _world: &mut World, _entity: Entity) {}

    /// Decide whether to process this frame.
    fn check_processing(&mut self, _world: &World) -> bool {
        true
    }

    /// Called before the active set is processed.
    fn begin(&mut self, _world: &mut World) {}

    /// Process the active set.
    fn process_entities(&mut self, world: &mut World, entities: &IndexedBag<Entity>);

    /// Called after the active set is processed.
    fn end(&mut self, _world: &mut World) {}
}

/// A registered system and the state the world keeps for it.
pub(crate) struct SystemSlot {
    index: usize,
    aspect: Aspect,
    passive: bool,
    actives: IndexedBag<Entity>,
    pub(crate) system: Box<dyn EntitySystem>,
}

impl SystemSlot {
    pub fn new(
        index: usize,
        aspect: Aspect,
        passive: bool,
        capacity: usize,
        system: Box<dyn EntitySystem>,
    ) -> SystemSlot {
        SystemSlot {
            index,
            aspect,
            passive,
            actives: IndexedBag::with_capacity(capacity),
            system,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is<S: EntitySystem>(&self) -> bool {
        (*self.system).as_any().is::<S>()
    }

    pub fn system_type_id(&self) -> TypeId {
        (*self.system).as_any().type_id()
    }

    pub fn is_passive(&self) -> bool {
        self.passive
    }

    pub fn actives(&self) -> &IndexedBag<Entity> {
        &self.actives
    }

    pub fn notify(&mut self, world: &mut World, notification: Notification, entity: Entity) {
        match notification {
            Notification::Added | Notification::Changed | Notification::Enabled =>
                self.check(world, entity),
            Notification::Deleted | Notification::Disabled => {
                if self.is_member(world, entity) {
                    self.remove_from_system(world, entity);
                }
            }
        }
    }

    fn is_member(&self, world: &World, entity: Entity) -> bool {
        world.entities.record(entity)
            .map_or(false, |r| r.system_bits().get(self.index))
    }

    /// Bring the membership of `entity` in line with its component bits.
    pub fn check(&mut self, world: &mut World, entity: Entity) {
        if self.aspect.is_dummy() {
            return;
        }

        let (contains, interested) = match world.entities.record(entity) {
            Some(record) => (
                record.system_bits().get(self.index),
                self.aspect.matches(record.component_bits()),
            ),
            None => return,
        };

        if interested && !contains {
            self.insert_to_system(world, entity);
        } else if !interested && contains {
            self.remove_from_system(world, entity);
        }
    }

    fn insert_to_system(&mut self, world: &mut World, entity: Entity) {
        self.actives.add(entity);
        if let Some(record) = world.entities.record_mut(entity) {
            record.system_bits_mut().set(self.index);
        }

        tracing::trace!(system = self.index, entity = entity.id(), "inserted into system");
        self.system.inserted(world, entity);
    }

    fn remove_from_system(&mut self, world: &mut World, entity: Entity) {
        self.actives.remove(&entity);
        if let Some(record) = world.entities.record_mut(entity) {
            record.system_bits_mut().clear(self.index);
        }

        tracing::trace!(system = self.index, entity = entity.id(), "removed from system");
        self.system.removed(world, entity);
    }

    /// Drop every membership bit this system holds.
    pub fn clear_memberships(&mut self, world: &mut World) {
        for entity in self.actives.iter() {
            if let Some(record) = world.entities.record_mut(*entity) {
                record.system_bits_mut().clear(self.index);
            }
        }
        self.actives.clear();
    }

    /// Run one frame of the system.
    pub fn process(&mut self, world: &mut World) {
        if self.system.check_processing(world) {
            self.system.begin(world);
            self.system.process_entities(world, &self.actives);
            self.system.end(world);
        }
    }
}
