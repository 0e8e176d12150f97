use crate::bag::IndexedBag;
use crate::entity::Entity;
use crate::error::Result;
use crate::world::World;

use super::EntitySystem;

/// Logic for a `VoidSystem`.
pub trait VoidProcessor: 'static {
    /// Called once by `World::initialize`.
    fn initialize(&mut self, _world: &mut World) -> Result<()> {
        Ok(())
    }

    /// Run one frame.
    fn process_system(&mut self, world: &mut World);
}

/// A system with no entities, run once every frame.
#[derive(Debug, Default)]
pub struct VoidSystem<P> {
    processor: P,
}

impl<P: VoidProcessor> VoidSystem<P> {
    /// Wrap `processor` in a system.
    pub fn new(processor: P) -> VoidSystem<P> {
        VoidSystem {
            processor,
        }
    }

    /// Return the wrapped processor.
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Return the wrapped processor mutably.
    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }
}

impl<P: VoidProcessor> EntitySystem for VoidSystem<P> {
    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.processor.initialize(world)
    }

    fn process_entities(&mut self, world: &mut World, _entities: &IndexedBag<Entity>) {
        self.processor.process_system(world);
    }
}
