use crate::aspect::{Aspect, AspectBuilder};
use crate::bag::IndexedBag;
use crate::entity::Entity;
use crate::error::Result;
use crate::world::World;

use super::EntitySystem;

/// Per-entity logic for a `ProcessingSystem` or an `IntervalSystem`.
pub trait EntityProcessor: 'static {
    /// Describe the entities to process.
    fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect;

    /// Called once by `World::initialize`.
    fn initialize(&mut self, _world: &mut World) -> Result<()> {
        Ok(())
    }

    /// An entity started matching.
    fn inserted(&mut self, _world: &mut World, _entity: Entity) {}

    /// An entity stopped matching.
    fn removed(&mut self, _world: &mut World, _entity: Entity) {}

    /// Called before the first entity of a frame.
    fn begin(&mut self, _world: &mut World) {}

    /// Process one entity.
    fn process(&mut self, world: &mut World, entity: Entity);

    /// Called after the last entity of a frame.
    fn end(&mut self, _world: &mut World) {}
}

/// A system which processes every matching entity once per frame.
#[derive(Debug, Default)]
pub struct ProcessingSystem<P> {
    processor: P,
}

impl<P: EntityProcessor> ProcessingSystem<P> {
    /// Wrap `processor` in a system.
    pub fn new(processor: P) -> ProcessingSystem<P> {
        ProcessingSystem {
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

impl<P: EntityProcessor> EntitySystem for ProcessingSystem<P> {
    fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect {
        self.processor.aspect(builder)
    }

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.processor.initialize(world)
    }

    fn inserted(&mut self, world: &mut World, entity: Entity) {
        self.processor.inserted(world, entity)
    }

    fn removed(&mut self, world: &mut World, entity: Entity) {
        self.processor.removed(world, entity)
    }

    fn begin(&mut self, world: &mut World) {
        self.processor.begin(world)
    }

    fn process_entities(&mut self, world: &mut World, entities: &IndexedBag<Entity>) {
        for entity in entities.iter() {
            self.processor.process(world, *entity);
        }
    }

    fn end(&mut self, world: &mut World) {
        self.processor.end(world)
    }
}
