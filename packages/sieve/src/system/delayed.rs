use crate::aspect::{Aspect, AspectBuilder};
use crate::bag::IndexedBag;
use crate::entity::Entity;
use crate::error::Result;
use crate::world::World;

use super::EntitySystem;

/// Per-entity logic for a `DelayedSystem`.
pub trait DelayedProcessor: 'static {
    /// Describe the entities to process.
    fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect;

    /// Called once by `World::initialize`.
    fn initialize(&mut self, _world: &mut World) -> Result<()> {
        Ok(())
    }

    /// An entity started matching. Its delay has already been offered.
    fn inserted(&mut self, _world: &mut World, _entity: Entity) {}

    /// An entity stopped matching.
    fn removed(&mut self, _world: &mut World, _entity: Entity) {}

    /// Return the time left before `entity` expires.
    fn remaining_delay(&self, world: &World, entity: Entity) -> f32;

    /// Tell `entity` that `accumulated` time has passed since the last pass.
    fn process_delta(&mut self, world: &mut World, entity: Entity, accumulated: f32);

    /// `entity` has no time left.
    fn process_expired(&mut self, world: &mut World, entity: Entity);
}

/// A system which sleeps until the soonest of its entities is due.
///
/// The system keeps a single countdown shared by all of its entities. Each
/// entity offers its remaining delay when it is inserted and after every pass,
/// and the countdown is rescheduled to the shortest offer. When nothing is
/// offered the system stops until an offer arrives.
#[derive(Debug)]
pub struct DelayedSystem<P> {
    processor: P,
    delay: f32,
    acc: f32,
    running: bool,
}

impl<P: DelayedProcessor> DelayedSystem<P> {
    /// Wrap `processor`. The system starts out stopped.
    pub fn new(processor: P) -> DelayedSystem<P> {
        DelayedSystem {
            processor,
            delay: 0.0,
            acc: 0.0,
            running: false,
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

    /// Start a new countdown of `delay`, cancelling the current one.
    pub fn restart(&mut self, delay: f32) {
        self.delay = delay;
        self.acc = 0.0;
        self.running = true;
    }

    /// Reschedule to `delay` if the system is stopped or `delay` is sooner
    /// than the current countdown.
    pub fn offer_delay(&mut self, delay: f32) {
        if !self.running || delay < self.remaining_time_until_processing() {
            self.restart(delay);
        }
    }

    /// Return the delay the current countdown started with.
    pub fn initial_delay(&self) -> f32 {
        self.delay
    }

    /// Return the time left on the countdown, or zero when stopped.
    pub fn remaining_time_until_processing(&self) -> f32 {
        if self.running {
            self.delay - self.acc
        } else {
            0.0
        }
    }

    /// Returns true if the countdown is running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Abort the countdown.
    pub fn stop(&mut self) {
        self.running = false;
        self.acc = 0.0;
    }
}

impl<P: DelayedProcessor> EntitySystem for DelayedSystem<P> {
    fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect {
        self.processor.aspect(builder)
    }

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.processor.initialize(world)
    }

    fn inserted(&mut self, world: &mut World, entity: Entity) {
        let delay = self.processor.remaining_delay(world, entity);
        if delay > 0.0 {
            self.offer_delay(delay);
        }
        self.processor.inserted(world, entity)
    }

    fn removed(&mut self, world: &mut World, entity: Entity) {
        self.processor.removed(world, entity)
    }

    fn check_processing(&mut self, world: &World) -> bool {
        if !self.running {
            return false;
        }

        self.acc += world.delta();
        self.acc >= self.delay
    }

    fn process_entities(&mut self, world: &mut World, entities: &IndexedBag<Entity>) {
        let accumulated = self.acc;
        self.stop();

        for entity in entities.iter() {
            self.processor.process_delta(world, *entity, accumulated);
            let remaining = self.processor.remaining_delay(world, *entity);
            if remaining <= 0.0 {
                self.processor.process_expired(world, *entity);
            } else {
                self.offer_delay(remaining);
            }
        }
    }
}
