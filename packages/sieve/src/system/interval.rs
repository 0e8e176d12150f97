use crate::aspect::{Aspect, AspectBuilder};
use crate::bag::IndexedBag;
use crate::entity::Entity;
use crate::error::Result;
use crate::world::World;

use super::{EntityProcessor, EntitySystem};

/// A system which processes its entities once every `interval` of world time.
///
/// Elapsed time is accumulated from the world delta. When a frame fires, the
/// interval is subtracted from the accumulator rather than clearing it, so the
/// period does not drift.
#[derive(Debug)]
pub struct IntervalSystem<P> {
    processor: P,
    interval: f32,
    acc: f32,
}

impl<P: EntityProcessor> IntervalSystem<P> {
    /// Wrap `processor`, running it every `interval`.
    pub fn new(interval: f32, processor: P) -> IntervalSystem<P> {
        IntervalSystem {
            processor,
            interval,
            acc: 0.0,
        }
    }

    /// Return the interval between runs.
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Return the time accumulated towards the next run.
    pub fn accumulated(&self) -> f32 {
        self.acc
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

impl<P: EntityProcessor> EntitySystem for IntervalSystem<P> {
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

    fn check_processing(&mut self, world: &World) -> bool {
        self.acc += world.delta();
        if self.acc >= self.interval {
            self.acc -= self.interval;
            true
        } else {
            false
        }
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
