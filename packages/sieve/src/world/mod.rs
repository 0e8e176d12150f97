//! The world: the clock and mutation queue tying everything together.
//!
//! Entity lifecycle calls (`add_entity`, `changed_entity`, `delete_entity`,
//! `enable`, `disable`) only queue intent. `World::process` flushes the queues
//! in a fixed order, notifying the component store, the entity directory, the
//! managers and then the systems, purges the components of deleted entities,
//! and finally runs every non-passive system.

use std::any::{self, Any, TypeId};
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

pub use entity_mut::EntityMut;
pub use mapper::ComponentMapper;
pub use template::EntityTemplate;

use crate::aspect::AspectBuilder;
use crate::bag::IndexedBag;
use crate::component::{AsAny, Component, ComponentType, PooledComponent};
use crate::component_store::ComponentStore;
use crate::config::WorldConfig;
use crate::entity::{Entity, EntityDirectory};
use crate::error::{Error, Result};
use crate::manager::{Manager, Notification};
use crate::registry::TypeRegistry;
use crate::system::{EntitySystem, SystemSlot};
use queue::EntityQueue;

mod entity_mut;
mod mapper;
mod queue;
mod template;

/// A system slot lent out of the world while one of its hooks runs.
struct InFlight {
    type_id: TypeId,
    retired: bool,
}

/// An ECS world.
///
/// ```ignore
/// let mut world = World::new();
/// world.set_system(ProcessingSystem::new(Movement));
/// world.initialize()?;
///
/// let ship = world.create_entity();
/// world.add_component(ship, Position::default())?;
/// world.add_entity(ship);
///
/// loop {
///     world.set_delta(frame_time);
///     world.process()?;
/// }
/// ```
pub struct World {
    config: WorldConfig,
    delta: f32,
    pub(crate) entities: EntityDirectory,
    pub(crate) components: ComponentStore,
    managers: Vec<Box<dyn Manager>>,
    systems: Vec<Option<SystemSlot>>,
    in_flight: Vec<InFlight>,
    next_system_index: usize,
    added: EntityQueue,
    changed: EntityQueue,
    deleted: EntityQueue,
    enabled: EntityQueue,
    disabled: EntityQueue,
    scratch: Vec<Entity>,
    templates: HashMap<String, Rc<dyn EntityTemplate>>,
}

impl World {
    /// Create a new world with the default configuration.
    pub fn new() -> World {
        World::with_config(WorldConfig::default())
    }

    /// Create a new world.
    pub fn with_config(config: WorldConfig) -> World {
        let capacity = config.entity_capacity;
        World {
            delta: config.delta,
            entities: EntityDirectory::with_capacity(capacity),
            components: ComponentStore::with_capacity(config.column_capacity),
            managers: Vec::new(),
            systems: Vec::new(),
            in_flight: Vec::new(),
            next_system_index: 0,
            added: EntityQueue::with_capacity(capacity),
            changed: EntityQueue::with_capacity(capacity),
            deleted: EntityQueue::with_capacity(capacity),
            enabled: EntityQueue::with_capacity(capacity),
            disabled: EntityQueue::with_capacity(capacity),
            scratch: Vec::with_capacity(capacity),
            templates: HashMap::new(),
            config,
        }
    }

    /// Return the configuration this world was created with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Return the time passed since the last frame.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Set the time passed since the last frame.
    pub fn set_delta(&mut self, delta: f32) {
        self.delta = delta;
    }

    /// Return the entity directory.
    pub fn entities(&self) -> &EntityDirectory {
        &self.entities
    }

    /// Return the component store.
    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    /// Return the component type registry.
    pub fn types(&self) -> &TypeRegistry {
        self.components.types()
    }

    /// Register `T` as a basic component type.
    pub fn register<T: Component>(&mut self) -> ComponentType {
        self.components.types_mut().type_for::<T>()
    }

    /// Register `T` as a pooled component type.
    ///
    /// This must be done before `T` is otherwise used in this world.
    pub fn register_pooled<T: PooledComponent>(&mut self) -> Result<ComponentType> {
        self.components.types_mut().register_pooled::<T>()
    }

    /// Start building an aspect against this world's types.
    pub fn aspect(&mut self) -> AspectBuilder<'_> {
        self.components.types_mut().aspect()
    }

    /// Return a mapper for `T`, registering `T` if needed.
    pub fn mapper<T: Component>(&mut self) -> ComponentMapper<T> {
        ComponentMapper::new(self.register::<T>())
    }

    /// Register a manager, replacing any existing manager of the same type.
    pub fn set_manager<M: Manager>(&mut self, manager: M) {
        let existing = self.managers.iter()
            .position(|m| (**m).as_any().is::<M>());
        match existing {
            Some(idx) => {
                tracing::warn!(manager = any::type_name::<M>(), "replaced manager");
                self.managers[idx] = Box::new(manager);
            }
            None => {
                tracing::debug!(manager = any::type_name::<M>(), "registered manager");
                self.managers.push(Box::new(manager));
            }
        }
    }

    /// Get the manager of type `M`.
    pub fn manager<M: Manager>(&self) -> Option<&M> {
        self.managers.iter()
            .find_map(|m| (**m).as_any().downcast_ref::<M>())
    }

    /// Mutably get the manager of type `M`.
    pub fn manager_mut<M: Manager>(&mut self) -> Option<&mut M> {
        self.managers.iter_mut()
            .find_map(|m| (**m).as_any_mut().downcast_mut::<M>())
    }

    /// Remove the manager of type `M`, returning it.
    pub fn delete_manager<M: Manager>(&mut self) -> Option<M> {
        let idx = self.managers.iter()
            .position(|m| (**m).as_any().is::<M>())?;
        self.managers.remove(idx)
            .into_any()
            .downcast::<M>()
            .ok()
            .map(|m| *m)
    }

    /// Register a system which is run by every `process()`.
    ///
    /// Registering a second system of the same type replaces the first.
    pub fn set_system<S: EntitySystem>(&mut self, system: S) {
        self.insert_system(system, false);
    }

    /// Register a passive system. It is kept up to date with entity changes but
    /// only runs through `process_system`.
    pub fn set_passive_system<S: EntitySystem>(&mut self, system: S) {
        self.insert_system(system, true);
    }

    fn insert_system<S: EntitySystem>(&mut self, system: S, passive: bool) {
        let in_flight = self.in_flight.iter()
            .any(|f| f.type_id == TypeId::of::<S>() && !f.retired);
        if self.delete_system::<S>().is_some() || in_flight {
            tracing::warn!(system = any::type_name::<S>(), "replaced system");
        }

        let aspect = system.aspect(self.components.types_mut().aspect());
        let index = self.next_system_index;
        self.next_system_index += 1;

        tracing::debug!(system = any::type_name::<S>(), index, passive, ?aspect, "registered system");
        self.systems.push(Some(SystemSlot::new(
            index,
            aspect,
            passive,
            self.config.active_set_capacity,
            Box::new(system))));
    }

    fn position<S: EntitySystem>(&self) -> Option<usize> {
        self.systems.iter()
            .position(|slot| slot.as_ref().map_or(false, |slot| slot.is::<S>()))
    }

    fn slot<S: EntitySystem>(&self) -> Option<&SystemSlot> {
        self.systems.iter()
            .flatten()
            .find(|slot| slot.is::<S>())
    }

    /// Get the system of type `S`.
    ///
    /// A system is not visible to its own hooks while they run.
    pub fn system<S: EntitySystem>(&self) -> Option<&S> {
        self.systems.iter()
            .flatten()
            .find_map(|slot| (*slot.system).as_any().downcast_ref::<S>())
    }

    /// Mutably get the system of type `S`.
    pub fn system_mut<S: EntitySystem>(&mut self) -> Option<&mut S> {
        self.systems.iter_mut()
            .flatten()
            .find_map(|slot| (*slot.system).as_any_mut().downcast_mut::<S>())
    }

    /// Return the entities currently active in the system of type `S`.
    pub fn active_entities<S: EntitySystem>(&self) -> Option<&IndexedBag<Entity>> {
        self.slot::<S>().map(|slot| slot.actives())
    }

    /// Remove the system of type `S`, returning it.
    ///
    /// The entities active in the system lose their membership without the
    /// system's `removed` hook being called. If the system is running one of
    /// its hooks, it is dropped once the hook returns and `None` is returned.
    pub fn delete_system<S: EntitySystem>(&mut self) -> Option<S> {
        let mut retired = false;
        for flight in self.in_flight.iter_mut().filter(|f| !f.retired) {
            if flight.type_id == TypeId::of::<S>() {
                flight.retired = true;
                retired = true;
            }
        }
        if retired {
            tracing::debug!(system = any::type_name::<S>(), "retiring running system");
            return None;
        }

        let idx = self.position::<S>()?;
        let mut slot = self.systems[idx].take()?;
        self.compact_systems();
        slot.clear_memberships(self);

        tracing::debug!(system = any::type_name::<S>(), index = slot.index(), "deleted system");
        slot.system.into_any()
            .downcast::<S>()
            .ok()
            .map(|s| *s)
    }

    /// Run the system of type `S` once, even if it is passive.
    ///
    /// Returns false if no such system is registered, or if it is the system
    /// asking.
    pub fn process_system<S: EntitySystem>(&mut self) -> bool {
        let idx = match self.position::<S>() {
            Some(idx) => idx,
            None => return false,
        };

        self.with_system(idx, |slot, world| slot.process(world));
        self.compact_systems();
        true
    }

    /// Initialize every manager, then every system, in registration order.
    pub fn initialize(&mut self) -> Result<()> {
        tracing::debug!(
            managers = self.managers.len(),
            systems = self.systems.len(),
            "initializing world");

        for manager in self.managers.iter_mut() {
            manager.initialize();
        }

        let mut result = Ok(());
        for idx in 0..self.systems.len() {
            self.with_system(idx, |slot, world| result = slot.system.initialize(world));
            if result.is_err() {
                break;
            }
        }
        self.compact_systems();
        result
    }

    /// Lend the system at `idx` out of the world for the duration of `f`, so
    /// its hooks can borrow the world mutably.
    fn with_system(&mut self, idx: usize, f: impl FnOnce(&mut SystemSlot, &mut World)) {
        let mut slot = match self.systems.get_mut(idx).and_then(Option::take) {
            Some(slot) => slot,
            None => return,
        };

        self.in_flight.push(InFlight {
            type_id: slot.system_type_id(),
            retired: false,
        });
        f(&mut slot, self);

        let retired = self.in_flight.pop().map_or(false, |f| f.retired);
        if retired {
            slot.clear_memberships(self);
            tracing::debug!(index = slot.index(), "deleted system");
        } else if let Some(entry) = self.systems.get_mut(idx) {
            *entry = Some(slot);
        }
    }

    /// Drop the holes left by deleted systems. Indices are only stable while
    /// a system is lent out, so this waits until none is.
    fn compact_systems(&mut self) {
        if self.in_flight.is_empty() {
            self.systems.retain(Option::is_some);
        }
    }

    /// Create a new entity. It is not part of the world until `add_entity`.
    pub fn create_entity(&mut self) -> Entity {
        self.entities.create(None)
    }

    /// Create a new entity with a debug name.
    pub fn create_named_entity(&mut self, name: impl Into<String>) -> Entity {
        self.entities.create(Some(name.into()))
    }

    /// Get mutable access to a live entity.
    pub fn entity_mut(&mut self, entity: Entity) -> Result<EntityMut<'_>> {
        if !self.is_alive(entity) {
            return Err(Error::DeadEntity(entity));
        }
        Ok(EntityMut::new(self, entity))
    }

    /// Get the handle of the active entity with `id`.
    pub fn get_entity(&self, id: usize) -> Option<Entity> {
        self.entities.entity(id)
    }

    /// Returns true if `entity` is the current incarnation of its id.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns true if `entity` is alive and has been added to the world.
    pub fn is_active(&self, entity: Entity) -> bool {
        self.is_alive(entity) && self.entities.is_active(entity.id())
    }

    /// Returns true if `entity` is alive and not disabled.
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.is_alive(entity) && self.entities.is_enabled(entity.id())
    }

    fn enqueue(&mut self, notification: Notification, entity: Entity) {
        if !self.is_alive(entity) {
            tracing::warn!(%entity, ?notification, "ignoring lifecycle call for a dead entity");
            return;
        }

        self.queue_mut(notification).push(entity);
    }

    fn queue_mut(&mut self, notification: Notification) -> &mut EntityQueue {
        match notification {
            Notification::Added => &mut self.added,
            Notification::Changed => &mut self.changed,
            Notification::Deleted => &mut self.deleted,
            Notification::Enabled => &mut self.enabled,
            Notification::Disabled => &mut self.disabled,
        }
    }

    /// Queue `entity` to be added to the world on the next `process()`.
    pub fn add_entity(&mut self, entity: Entity) {
        self.enqueue(Notification::Added, entity);
    }

    /// Queue a change notification, so systems re-evaluate `entity` after its
    /// components were added or removed.
    pub fn changed_entity(&mut self, entity: Entity) {
        self.enqueue(Notification::Changed, entity);
    }

    /// Queue `entity` for deletion. Deleting twice is harmless.
    pub fn delete_entity(&mut self, entity: Entity) {
        self.enqueue(Notification::Deleted, entity);
    }

    /// Queue `entity` to be enabled.
    pub fn enable(&mut self, entity: Entity) {
        self.enqueue(Notification::Enabled, entity);
    }

    /// Queue `entity` to be disabled.
    pub fn disable(&mut self, entity: Entity) {
        self.enqueue(Notification::Disabled, entity);
    }

    /// Create a `T` on `entity`. Pooled types reuse a freed instance when they
    /// can.
    pub fn create_component<T: Component + Default>(&mut self, entity: Entity) -> Result<&mut T> {
        let record = self.entities.record_mut(entity)
            .ok_or(Error::DeadEntity(entity))?;
        self.components.create::<T>(record)
    }

    /// Attach `component` to `entity`.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<()> {
        let record = self.entities.record_mut(entity)
            .ok_or(Error::DeadEntity(entity))?;
        self.components.add(record, component)
    }

    /// Attach a pre-built, type-erased `component` to `entity`.
    pub fn add_boxed_component(
        &mut self,
        entity: Entity,
        component_type: &ComponentType,
        component: Box<dyn Component>,
    ) -> Result<()> {
        let record = self.entities.record_mut(entity)
            .ok_or(Error::DeadEntity(entity))?;
        self.components.add_component(record, component_type, component)
    }

    /// Detach the `T` held by `entity`. Returns true if it had one.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<bool> {
        match self.components.types().get::<T>() {
            Some(component_type) => self.remove_component_type(entity, &component_type),
            None => Ok(false),
        }
    }

    /// Detach the component of `component_type` held by `entity`.
    pub fn remove_component_type(&mut self, entity: Entity, component_type: &ComponentType) -> Result<bool> {
        let record = self.entities.record_mut(entity)
            .ok_or(Error::DeadEntity(entity))?;
        self.components.remove_component(record, component_type)
    }

    /// Get the `T` held by `entity`.
    pub fn component<T: Component>(&self, entity: Entity) -> Option<&T> {
        let record = self.entities.record(entity)?;
        self.components.get::<T>(record)
    }

    /// Mutably get the `T` held by `entity`.
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let record = self.entities.record(entity)?;
        self.components.get_mut::<T>(record)
    }

    /// Returns true if `entity` holds a `T`.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        let component_type = match self.components.types().get::<T>() {
            Some(t) => t,
            None => return false,
        };
        self.entities.record(entity)
            .map_or(false, |r| r.component_bits().get(component_type.index()))
    }

    /// Push every component held by `entity` into `fill`.
    pub fn components_for<'w>(&'w self, entity: Entity, fill: &mut IndexedBag<&'w dyn Component>) -> Result<()> {
        let record = self.entities.record(entity)
            .ok_or(Error::DeadEntity(entity))?;
        self.components.components_for(record, fill);
        Ok(())
    }

    /// Register an entity template under `tag`.
    pub fn register_template(&mut self, tag: impl Into<String>, template: impl EntityTemplate) {
        let tag = tag.into();
        tracing::debug!(%tag, "registered entity template");
        if self.templates.insert(tag.clone(), Rc::new(template)).is_some() {
            tracing::warn!(%tag, "replaced entity template");
        }
    }

    /// Create a bare entity and let the template registered under `tag` build
    /// it.
    pub fn create_entity_from_template(&mut self, tag: &str, args: &dyn Any) -> Result<Entity> {
        let template = self.templates.get(tag)
            .cloned()
            .ok_or_else(|| Error::UnknownTemplate(tag.to_string()))?;

        let entity = self.create_entity();
        let built = template.build_entity(entity, self, args);
        if built.is_err() {
            self.delete_entity(entity);
        }
        built
    }

    fn flush(&mut self, notification: Notification) {
        if self.queue_mut(notification).is_empty() {
            return;
        }

        let mut batch = mem::take(&mut self.scratch);
        self.queue_mut(notification).drain_into(&mut batch);
        tracing::trace!(?notification, count = batch.len(), "flushing entity queue");

        for entity in batch.iter().copied() {
            if !self.entities.is_alive(entity) {
                continue;
            }

            notification.deliver(&mut self.components, entity);
            notification.deliver(&mut self.entities, entity);
            for manager in self.managers.iter_mut() {
                notification.deliver(&mut **manager, entity);
            }
            for idx in 0..self.systems.len() {
                self.with_system(idx, |slot, world| slot.notify(world, notification, entity));
            }
        }
        self.compact_systems();

        batch.clear();
        self.scratch = batch;
    }

    /// Run one frame.
    ///
    /// The queues are flushed in the order added, changed, disabled, enabled,
    /// deleted. Then the components of deleted entities are purged and their
    /// ids recycled, and every non-passive system is processed in registration
    /// order.
    pub fn process(&mut self) -> Result<()> {
        self.flush(Notification::Added);
        self.flush(Notification::Changed);
        self.flush(Notification::Disabled);
        self.flush(Notification::Enabled);
        self.flush(Notification::Deleted);

        self.components.clean(&mut self.entities)?;
        self.entities.release_deleted();

        // Systems registered while this frame runs wait for the next one.
        for idx in 0..self.systems.len() {
            let active = self.systems.get(idx)
                .and_then(Option::as_ref)
                .map_or(false, |slot| !slot.is_passive());
            if active {
                self.with_system(idx, |slot, world| slot.process(world));
            }
        }
        self.compact_systems();
        Ok(())
    }
}

impl Default for World {
    fn default() -> World {
        World::new()
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use super::*;
    use crate::aspect::Aspect;
    use crate::component;
    use crate::manager::EntityObserver;
    use crate::managers::TagManager;
    use crate::system::{EntityProcessor, ProcessingSystem, VoidProcessor, VoidSystem};

    #[derive(Debug, Default, PartialEq)]
    struct A(u32);
    #[derive(Debug, Default, PartialEq)]
    struct B;
    #[derive(Debug, Default, PartialEq)]
    struct C;
    #[derive(Debug, Default, PartialEq)]
    struct Shell {
        fired: bool,
    }

    component!(A, B, C, Shell);

    impl PooledComponent for Shell {
        fn reset(&mut self) {
            self.fired = false;
        }
    }

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every membership change, tagged with its name.
    struct Watch<const N: usize> {
        name: &'static str,
        log: Log,
        build: fn(AspectBuilder<'_>) -> Aspect,
        processed: usize,
    }

    impl<const N: usize> Watch<N> {
        fn new(name: &'static str, log: &Log, build: fn(AspectBuilder<'_>) -> Aspect) -> Self {
            Watch {
                name,
                log: log.clone(),
                build,
                processed: 0,
            }
        }
    }

    impl<const N: usize> EntityProcessor for Watch<N> {
        fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect {
            (self.build)(builder)
        }

        fn inserted(&mut self, _world: &mut World, entity: Entity) {
            self.log.borrow_mut().push(format!("{} +{}", self.name, entity.id()));
        }

        fn removed(&mut self, _world: &mut World, entity: Entity) {
            self.log.borrow_mut().push(format!("{} -{}", self.name, entity.id()));
        }

        fn process(&mut self, _world: &mut World, _entity: Entity) {
            self.processed += 1;
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow_mut().drain(..).collect()
    }

    fn consistent(world: &World) -> bool {
        world.entities().records().all(|record| {
            world.types().iter().all(|ty| {
                record.component_bits().get(ty.index())
                    == world.components().get_component(record, ty).is_some()
            })
        })
    }

    #[test]
    fn test_lifecycle_keeps_bits_and_columns_in_step() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, A(1)).unwrap();
        world.create_component::<B>(e).unwrap();
        world.add_entity(e);
        world.process().unwrap();
        assert!(consistent(&world));
        assert!(world.has_component::<B>(e));

        assert_eq!(world.remove_component::<B>(e), Ok(true));
        assert_eq!(world.remove_component::<C>(e), Ok(false));
        assert!(consistent(&world));

        world.delete_entity(e);
        world.process().unwrap();
        assert!(consistent(&world));
        assert!(!world.is_alive(e));
        assert_eq!(world.component::<A>(e), None);
    }

    #[test]
    fn test_recycled_id_starts_clean() {
        let log = Log::default();
        let mut world = World::new();
        world.set_system(ProcessingSystem::new(
            Watch::<0>::new("s", &log, |b| b.all::<A>().build())));

        let entities: Vec<_> = (0..6).map(|_| world.create_entity()).collect();
        let five = entities[5];
        assert_eq!(five.id(), 5);
        world.add_component(five, A(5)).unwrap();
        world.add_entity(five);
        world.process().unwrap();
        assert!(!world.entities().record(five).unwrap().system_bits().is_empty());

        world.delete_entity(five);
        world.process().unwrap();

        let reborn = world.create_entity();
        assert_eq!(reborn.id(), 5);
        assert_ne!(reborn.uuid(), five.uuid());
        let record = world.entities().record(reborn).unwrap();
        assert!(record.component_bits().is_empty());
        assert!(record.system_bits().is_empty());
        assert_eq!(world.component::<A>(reborn), None);
    }

    #[test]
    fn test_pooled_round_trip() {
        let mut world = World::new();
        let shell = world.register_pooled::<Shell>().unwrap();
        let e = world.create_entity();

        let first = world.create_component::<Shell>(e).unwrap();
        first.fired = true;
        let addr = &*first as *const Shell;
        assert_eq!(world.remove_component::<Shell>(e), Ok(true));
        assert_eq!(world.components().pool().available(&shell), 1);

        let second = world.create_component::<Shell>(e).unwrap();
        assert_eq!(&*second as *const Shell, addr);
        assert!(!second.fired);
        assert_eq!(world.components().pool().available(&shell), 0);
    }

    #[test]
    fn test_aspect_truth_table() {
        let log = Log::default();
        let mut world = World::new();
        world.set_system(ProcessingSystem::new(
            Watch::<0>::new("ab", &log, |b| b.all::<A>().all::<B>().build())));
        world.set_system(ProcessingSystem::new(
            Watch::<1>::new("a!c", &log, |b| b.all::<A>().exclude::<C>().build())));
        world.set_system(ProcessingSystem::new(
            Watch::<2>::new("a|b", &log, |b| b.one::<A>().one::<B>().build())));

        let ab = world.create_entity();
        world.add_component(ab, A(0)).unwrap();
        world.add_component(ab, B).unwrap();
        world.add_entity(ab);

        let ac = world.create_entity();
        world.add_component(ac, A(0)).unwrap();
        world.add_component(ac, C).unwrap();
        world.add_entity(ac);

        let bare = world.create_entity();
        world.add_entity(bare);
        world.process().unwrap();

        let mut seen = entries(&log);
        seen.sort();
        assert_eq!(seen, vec!["a!c +0", "ab +0", "a|b +0", "a|b +1"]);

        world.remove_component::<B>(ab).unwrap();
        world.changed_entity(ab);
        world.add_component(bare, A(0)).unwrap();
        world.changed_entity(bare);
        world.process().unwrap();
        assert_eq!(entries(&log), vec!["ab -0", "a!c +2", "a|b +2"]);

        // Nothing changed, so nothing fires again.
        world.changed_entity(ab);
        world.process().unwrap();
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn test_one_overrides_all() {
        let log = Log::default();
        let mut world = World::new();
        world.set_system(ProcessingSystem::new(
            Watch::<0>::new("s", &log, |b| b.all::<A>().one::<B>().one::<C>().build())));

        let e = world.create_entity();
        world.add_component(e, A(0)).unwrap();
        world.add_entity(e);
        world.process().unwrap();
        assert!(entries(&log).is_empty());
        assert_eq!(world.active_entities::<ProcessingSystem<Watch<0>>>().map(|a| a.len()), Some(0));
    }

    #[test]
    fn test_systems_notified_in_registration_order() {
        let log = Log::default();
        let mut world = World::new();
        world.set_system(ProcessingSystem::new(
            Watch::<0>::new("s1", &log, |b| b.all::<A>().build())));
        world.set_system(ProcessingSystem::new(
            Watch::<1>::new("s2", &log, |b| b.all::<A>().build())));

        let e = world.create_entity();
        world.add_component(e, A(0)).unwrap();
        world.add_entity(e);
        world.process().unwrap();
        assert_eq!(entries(&log), vec!["s1 +0", "s2 +0"]);
    }

    #[test]
    fn test_disable_and_enable() {
        let log = Log::default();
        let mut world = World::new();
        world.set_system(ProcessingSystem::new(
            Watch::<0>::new("s", &log, |b| b.all::<A>().build())));

        let e = world.create_entity();
        world.add_component(e, A(0)).unwrap();
        world.add_entity(e);
        world.process().unwrap();
        assert_eq!(world.system::<ProcessingSystem<Watch<0>>>().unwrap().processor().processed, 1);

        world.disable(e);
        world.process().unwrap();
        assert!(!world.is_enabled(e));
        assert_eq!(world.system::<ProcessingSystem<Watch<0>>>().unwrap().processor().processed, 1);

        world.enable(e);
        world.process().unwrap();
        assert!(world.is_enabled(e));
        assert_eq!(entries(&log), vec!["s +0", "s -0", "s +0"]);
        assert_eq!(world.system::<ProcessingSystem<Watch<0>>>().unwrap().processor().processed, 2);
    }

    #[test]
    fn test_double_delete_frees_once() {
        let mut world = World::new();
        let shell = world.register_pooled::<Shell>().unwrap();
        let e = world.create_entity();
        world.create_component::<Shell>(e).unwrap();
        world.add_entity(e);
        world.process().unwrap();

        world.delete_entity(e);
        world.delete_entity(e);
        world.process().unwrap();
        assert_eq!(world.components().pool().available(&shell), 1);
        assert_eq!(world.entities().total_deleted(), 1);
        assert_eq!(world.entities().active_count(), 0);

        // A second clean with nothing deleted changes nothing.
        world.process().unwrap();
        assert_eq!(world.components().pool().available(&shell), 1);

        // The stale handle is ignored.
        world.delete_entity(e);
        world.process().unwrap();
        assert_eq!(world.entities().total_deleted(), 1);
    }

    #[test]
    fn test_dead_handles() {
        let mut world = World::new();
        let e = world.create_entity();
        world.delete_entity(e);
        world.process().unwrap();

        assert_eq!(world.add_component(e, A(0)), Err(Error::DeadEntity(e)));
        assert!(world.entity_mut(e).is_err());
        let mut fill = IndexedBag::new();
        assert!(world.components_for(e, &mut fill).is_err());
    }

    #[test]
    fn test_passive_system() {
        let log = Log::default();
        let mut world = World::new();
        world.set_passive_system(ProcessingSystem::new(
            Watch::<0>::new("p", &log, |b| b.all::<A>().build())));

        let e = world.create_entity();
        world.add_component(e, A(0)).unwrap();
        world.add_entity(e);
        world.process().unwrap();
        assert_eq!(entries(&log), vec!["p +0"]);
        assert_eq!(world.system::<ProcessingSystem<Watch<0>>>().unwrap().processor().processed, 0);

        assert!(world.process_system::<ProcessingSystem<Watch<0>>>());
        assert_eq!(world.system::<ProcessingSystem<Watch<0>>>().unwrap().processor().processed, 1);
        assert!(!world.process_system::<ProcessingSystem<Watch<1>>>());
    }

    #[test]
    fn test_delete_system_clears_membership() {
        let log = Log::default();
        let mut world = World::new();
        world.set_system(ProcessingSystem::new(
            Watch::<0>::new("s", &log, |b| b.all::<A>().build())));

        let e = world.create_entity();
        world.add_component(e, A(0)).unwrap();
        world.add_entity(e);
        world.process().unwrap();
        assert!(world.entities().record(e).unwrap().system_bits().get(0));

        let system = world.delete_system::<ProcessingSystem<Watch<0>>>().unwrap();
        assert_eq!(system.processor().name, "s");
        assert!(world.entities().record(e).unwrap().system_bits().is_empty());
        assert!(world.system::<ProcessingSystem<Watch<0>>>().is_none());
    }

    #[derive(Default)]
    struct Counter {
        frames: usize,
    }

    impl VoidProcessor for Counter {
        fn process_system(&mut self, world: &mut World) {
            self.frames += 1;
            let e = world.create_entity();
            world.add_entity(e);
        }
    }

    #[test]
    fn test_void_system_runs_every_frame() {
        let mut world = World::new();
        world.set_system(VoidSystem::new(Counter::default()));
        world.process().unwrap();
        world.process().unwrap();

        assert_eq!(world.system::<VoidSystem<Counter>>().unwrap().processor().frames, 2);
        assert_eq!(world.entities().total_added(), 1);
        assert_eq!(world.entities().total_created(), 2);
    }

    #[derive(Default)]
    struct Census {
        added: usize,
        deleted: usize,
    }

    impl EntityObserver for Census {
        fn added(&mut self, _entity: Entity) {
            self.added += 1;
        }

        fn deleted(&mut self, _entity: Entity) {
            self.deleted += 1;
        }
    }

    impl Manager for Census {}

    #[test]
    fn test_managers() {
        let mut world = World::new();
        world.set_manager(Census::default());
        world.initialize().unwrap();

        let e = world.create_entity();
        world.add_entity(e);
        world.process().unwrap();
        world.delete_entity(e);
        world.process().unwrap();

        let census = world.manager::<Census>().unwrap();
        assert_eq!((census.added, census.deleted), (1, 1));

        world.manager_mut::<Census>().unwrap().added = 0;
        let census = world.delete_manager::<Census>().unwrap();
        assert_eq!(census.added, 0);
        assert!(world.manager::<Census>().is_none());
    }

    #[test]
    fn test_mapper() {
        let mut world = World::new();
        let mapper = world.mapper::<A>();
        let e = world.create_entity();
        assert!(!mapper.has(&world, e));

        world.add_component(e, A(3)).unwrap();
        assert_eq!(mapper.get(&world, e), Some(&A(3)));
        mapper.get_mut(&mut world, e).unwrap().0 = 4;
        assert_eq!(world.component::<A>(e), Some(&A(4)));
    }

    struct Spawner;

    impl EntityTemplate for Spawner {
        fn build_entity(&self, entity: Entity, world: &mut World, args: &dyn Any) -> Result<Entity> {
            let value = args.downcast_ref::<u32>().copied().unwrap_or_default();
            world.entity_mut(entity)?
                .with(A(value))?
                .add_to_world();
            Ok(entity)
        }
    }

    #[test]
    fn test_templates() {
        let mut world = World::new();
        assert_eq!(
            world.create_entity_from_template("missing", &()),
            Err(Error::UnknownTemplate("missing".into())));

        world.register_template("spawner", Spawner);
        let e = world.create_entity_from_template("spawner", &7u32).unwrap();
        assert_eq!(world.component::<A>(e), Some(&A(7)));

        world.process().unwrap();
        assert!(world.is_active(e));
        assert_eq!(world.get_entity(e.id()), Some(e));
    }

    fn broken(entity: Entity, world: &mut World, _args: &dyn Any) -> Result<Entity> {
        world.add_component(entity, A(1))?;
        Err(Error::InvalidComponentIndex(99))
    }

    #[test]
    fn test_failed_template_discards_entity() {
        let mut world = World::new();
        world.register_template("broken", broken);
        let before = world.entities().total_created();

        assert_eq!(
            world.create_entity_from_template("broken", &()),
            Err(Error::InvalidComponentIndex(99)));
        assert_eq!(world.entities().total_created(), before + 1);
        let bare = world.entities().records().map(|r| r.entity()).next().unwrap();
        assert!(world.is_alive(bare));

        world.process().unwrap();
        assert!(!world.is_alive(bare));
        assert!(!world.is_active(bare));
        assert_eq!(world.entities().records().count(), 0);
        assert!(consistent(&world));
    }

    /// Looks up a manager when an entity arrives and another system while
    /// processing.
    #[derive(Default)]
    struct Greeter {
        greeted: Vec<String>,
        watched: Option<usize>,
    }

    impl EntityProcessor for Greeter {
        fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect {
            builder.all::<A>().build()
        }

        fn inserted(&mut self, world: &mut World, entity: Entity) {
            let tag = world.manager::<TagManager>()
                .and_then(|tags| tags.tag(entity))
                .unwrap_or("?");
            self.greeted.push(tag.to_string());
        }

        fn process(&mut self, world: &mut World, _entity: Entity) {
            self.watched = world.active_entities::<ProcessingSystem<Watch<0>>>().map(|a| a.len());
        }
    }

    #[test]
    fn test_hooks_see_managers_and_other_systems() {
        let log = Log::default();
        let mut world = World::new();
        world.set_manager(TagManager::new());
        world.set_system(ProcessingSystem::new(
            Watch::<0>::new("w", &log, |b| b.all::<A>().build())));
        world.set_system(ProcessingSystem::new(Greeter::default()));

        let e = world.create_entity();
        world.add_component(e, A(0)).unwrap();
        world.manager_mut::<TagManager>().unwrap().register("hero", e);
        world.add_entity(e);
        world.process().unwrap();

        let greeter = world.system::<ProcessingSystem<Greeter>>().unwrap().processor();
        assert_eq!(greeter.greeted, vec!["hero"]);
        assert_eq!(greeter.watched, Some(1));
        assert_eq!(world.systems.len(), 2);
    }

    struct Replacer {
        generation: usize,
    }

    impl VoidProcessor for Replacer {
        fn process_system(&mut self, world: &mut World) {
            world.set_system(VoidSystem::new(Replacer { generation: self.generation + 1 }));
        }
    }

    #[test]
    fn test_system_replaced_from_its_own_hook() {
        let mut world = World::new();
        world.set_system(VoidSystem::new(Replacer { generation: 0 }));
        world.process().unwrap();
        world.process().unwrap();

        assert_eq!(world.systems.iter().flatten().count(), 1);
        assert_eq!(world.systems.len(), 1);
        assert!(world.in_flight.is_empty());
        assert_eq!(world.system::<VoidSystem<Replacer>>().unwrap().processor().generation, 2);
    }

    #[test]
    fn test_large_delete_batch() {
        const COUNT: usize = 20_000;

        let mut world = World::new();
        let shell = world.register_pooled::<Shell>().unwrap();
        let entities: Vec<Entity> = (0..COUNT).map(|_| world.create_entity()).collect();
        for e in entities.iter().copied() {
            world.create_component::<Shell>(e).unwrap();
            world.add_entity(e);
        }
        world.process().unwrap();
        assert_eq!(world.entities().active_count(), COUNT);

        for e in entities.iter().copied() {
            world.delete_entity(e);
            world.delete_entity(e);
        }
        world.process().unwrap();

        assert_eq!(world.entities().active_count(), 0);
        assert_eq!(world.entities().total_deleted(), COUNT);
        assert_eq!(world.components().pool().available(&shell), COUNT);
        assert!(entities.iter().all(|e| !world.is_alive(*e)));
        assert_eq!(world.create_entity().id(), COUNT - 1);
    }
}
