//! Columnar storage of component instances.
//!
//! Each registered component type has one column, addressed by entity id. A
//! column slot is occupied exactly when the owning entity has the bit for that
//! type set; every method here takes the owner's `EntityRecord` so the two are
//! always updated together.

use std::any;

use crate::bag::IndexedBag;
use crate::bits::BitVector;
use crate::component::{AsAny, Component, ComponentType, Taxonomy};
use crate::entity::{Entity, EntityDirectory, EntityRecord};
use crate::error::{Error, Result};
use crate::manager::EntityObserver;
use crate::pool::ComponentPool;
use crate::registry::TypeRegistry;

type Column = IndexedBag<Box<dyn Component>>;

/// Owns every component instance in a world.
#[derive(Debug)]
pub struct ComponentStore {
    types: TypeRegistry,
    columns: IndexedBag<Column>,
    pool: ComponentPool,
    deleted: Vec<Entity>,
    pending: BitVector,
    column_capacity: usize,
}

impl ComponentStore {
    /// Create a new store whose columns start with room for `column_capacity`
    /// entities.
    pub fn with_capacity(column_capacity: usize) -> ComponentStore {
        ComponentStore {
            types: TypeRegistry::new(),
            columns: IndexedBag::new(),
            pool: ComponentPool::new(),
            deleted: Vec::new(),
            pending: BitVector::new(),
            column_capacity,
        }
    }

    /// Return the type registry of this store.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Return the type registry of this store mutably.
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// Return the pool recycling pooled instances.
    pub fn pool(&self) -> &ComponentPool {
        &self.pool
    }

    fn column_mut(&mut self, index: usize) -> &mut Column {
        let capacity = self.column_capacity;
        self.columns.get_or_insert_with(index, || IndexedBag::with_capacity(capacity))
    }

    /// Return the column for `component_type`, if anything was ever stored in it.
    pub fn column(&self, component_type: &ComponentType) -> Option<&Column> {
        self.columns.get(component_type.index()).ok().flatten()
    }

    fn attach(
        &mut self,
        owner: &mut EntityRecord,
        component_type: &ComponentType,
        component: Box<dyn Component>,
    ) -> Option<Box<dyn Component>> {
        let id = owner.entity().id();
        let previous = self.column_mut(component_type.index()).insert(id, component);
        owner.component_bits_mut().set(component_type.index());
        previous
    }

    fn detach(
        &mut self,
        owner: &mut EntityRecord,
        component_type: &ComponentType,
    ) -> Option<Box<dyn Component>> {
        let id = owner.entity().id();
        owner.component_bits_mut().clear(component_type.index());
        match self.columns.get_mut(component_type.index()) {
            Ok(Some(column)) => column.take(id),
            _ => None,
        }
    }

    fn release(&mut self, component_type: &ComponentType, component: Box<dyn Component>) {
        match component_type.taxonomy() {
            Taxonomy::Basic => {}
            Taxonomy::Pooled => self.pool.free(component, component_type),
        }
    }

    /// Create a `T` and attach it to `owner`.
    ///
    /// Basic components are always freshly built. Pooled components first
    /// return the instance `owner` already holds (if any) to the pool, and then
    /// take one from the pool, building a new one only when it is empty.
    pub fn create<T: Component + Default>(&mut self, owner: &mut EntityRecord) -> Result<&mut T> {
        let component_type = self.types.type_for::<T>();
        let component: Box<dyn Component> = match component_type.taxonomy() {
            Taxonomy::Basic => Box::new(T::default()),
            Taxonomy::Pooled => {
                if let Some(held) = self.detach(owner, &component_type) {
                    self.release(&component_type, held);
                }
                self.pool.obtain(&component_type, || Box::new(T::default()))
            }
        };

        self.attach(owner, &component_type, component);
        self.column_mut(component_type.index())
            .safe_get_mut(owner.entity().id())
            .and_then(|c| c.downcast_mut::<T>())
            .ok_or(Error::InvalidComponentType {
                expected: component_type.name(),
                found: any::type_name::<T>(),
            })
    }

    /// Attach a pre-built `component` to `owner` under `component_type`.
    ///
    /// Any instance of the same type which `owner` already held is released.
    pub fn add_component(
        &mut self,
        owner: &mut EntityRecord,
        component_type: &ComponentType,
        component: Box<dyn Component>,
    ) -> Result<()> {
        let component_type = self.types.validate(component_type)?;
        if !component_type.describes(&*component) {
            return Err(Error::InvalidComponentType {
                expected: component_type.name(),
                found: (*component).type_name(),
            });
        }

        if let Some(previous) = self.attach(owner, &component_type, component) {
            self.release(&component_type, previous);
        }
        Ok(())
    }

    /// Attach `component` to `owner`, registering its type if needed.
    pub fn add<T: Component>(&mut self, owner: &mut EntityRecord, component: T) -> Result<()> {
        let component_type = self.types.type_for::<T>();
        self.add_component(owner, &component_type, Box::new(component))
    }

    /// Detach the component of `component_type` from `owner`.
    ///
    /// Pooled instances go back to the pool. Returns true if `owner` had one.
    pub fn remove_component(
        &mut self,
        owner: &mut EntityRecord,
        component_type: &ComponentType,
    ) -> Result<bool> {
        let component_type = self.types.validate(component_type)?;
        match self.detach(owner, &component_type) {
            Some(component) => {
                self.release(&component_type, component);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Get the component of `component_type` held by the entity with `id`.
    pub fn fetch(&self, component_type: &ComponentType, id: usize) -> Option<&dyn Component> {
        self.column(component_type)
            .and_then(|column| column.get(id).ok().flatten())
            .map(|c| &**c)
    }

    /// Mutably get the component of `component_type` held by the entity with `id`.
    pub fn fetch_mut(&mut self, component_type: &ComponentType, id: usize) -> Option<&mut dyn Component> {
        match self.columns.get_mut(component_type.index()) {
            Ok(Some(column)) => match column.get_mut(id) {
                Ok(Some(component)) => Some(&mut **component),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the component of `component_type` held by `owner`.
    pub fn get_component(&self, owner: &EntityRecord, component_type: &ComponentType) -> Option<&dyn Component> {
        self.fetch(component_type, owner.entity().id())
    }

    /// Get the `T` held by `owner`.
    pub fn get<T: Component>(&self, owner: &EntityRecord) -> Option<&T> {
        let component_type = self.types.get::<T>()?;
        self.fetch(&component_type, owner.entity().id())
            .and_then(|c| c.downcast_ref::<T>())
    }

    /// Mutably get the `T` held by `owner`.
    pub fn get_mut<T: Component>(&mut self, owner: &EntityRecord) -> Option<&mut T> {
        let component_type = self.types.get::<T>()?;
        self.fetch_mut(&component_type, owner.entity().id())
            .and_then(|c| c.downcast_mut::<T>())
    }

    /// Push every component held by `owner` into `fill`.
    ///
    /// `fill` is not cleared first.
    pub fn components_for<'s>(&'s self, owner: &EntityRecord, fill: &mut IndexedBag<&'s dyn Component>) {
        let id = owner.entity().id();
        for index in owner.component_bits().ones() {
            let found = self.columns.get(index).ok().flatten()
                .and_then(|column| column.get(id).ok().flatten());
            if let Some(component) = found {
                fill.add(&**component);
            }
        }
    }

    /// Purge the components of every entity deleted since the last call.
    ///
    /// Calling this again with no deletions in between does nothing.
    pub fn clean(&mut self, entities: &mut EntityDirectory) -> Result<()> {
        let deleted = std::mem::take(&mut self.deleted);
        self.pending.clear_all();
        if !deleted.is_empty() {
            tracing::trace!(count = deleted.len(), "purging components of deleted entities");
        }

        for entity in deleted {
            let owner = match entities.record_mut(entity) {
                Some(owner) => owner,
                None => continue,
            };

            let attached: Vec<usize> = owner.component_bits().ones().collect();
            for index in attached {
                let component_type = self.types.type_at(index)?;
                if let Some(component) = self.detach(owner, &component_type) {
                    self.release(&component_type, component);
                }
            }
            owner.component_bits_mut().clear_all();
        }

        Ok(())
    }
}

impl Default for ComponentStore {
    fn default() -> ComponentStore {
        ComponentStore::with_capacity(64)
    }
}

impl EntityObserver for ComponentStore {
    fn deleted(&mut self, entity: Entity) {
        // Ids are not recycled until after `clean`, so the id alone tells
        // whether this entity is already waiting.
        if !self.pending.get(entity.id()) {
            self.pending.set(entity.id());
            self.deleted.push(entity);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::component;
    use crate::component::PooledComponent;

    #[derive(Debug, Default, PartialEq)]
    struct Position(i32, i32);
    #[derive(Debug, Default, PartialEq)]
    struct Label(&'static str);
    #[derive(Debug, Default, PartialEq)]
    struct Particle {
        life: u32,
    }

    component!(Position, Label, Particle);

    impl PooledComponent for Particle {
        fn reset(&mut self) {
            self.life = 0;
        }
    }

    fn consistent(store: &ComponentStore, entities: &EntityDirectory) -> bool {
        entities.records().all(|record| {
            store.types().iter().all(|ty| {
                record.component_bits().get(ty.index())
                    == store.get_component(record, ty).is_some()
            })
        })
    }

    #[test]
    fn test_bits_follow_columns() {
        let mut entities = EntityDirectory::default();
        let mut store = ComponentStore::default();
        let e = entities.create(None);
        let record = entities.record_mut(e).unwrap();

        store.create::<Position>(record).unwrap().0 = 4;
        store.add(record, Label("hello")).unwrap();
        assert_eq!(store.get::<Position>(record), Some(&Position(4, 0)));
        assert_eq!(record.component_bits().count_ones(), 2);
        assert!(consistent(&store, &entities));

        let label = store.types_mut().type_for::<Label>();
        let record = entities.record_mut(e).unwrap();
        assert_eq!(store.remove_component(record, &label), Ok(true));
        assert_eq!(store.remove_component(record, &label), Ok(false));
        assert!(store.get::<Label>(record).is_none());
        assert!(consistent(&store, &entities));

        store.deleted(e);
        store.clean(&mut entities).unwrap();
        assert!(entities.record(e).unwrap().component_bits().is_empty());
        assert!(consistent(&store, &entities));
    }

    #[test]
    fn test_add_component_checks_type() {
        let mut entities = EntityDirectory::default();
        let mut store = ComponentStore::default();
        let e = entities.create(None);
        let position = store.types_mut().type_for::<Position>();
        let record = entities.record_mut(e).unwrap();

        let err = store.add_component(record, &position, Box::new(Label("nope")))
            .unwrap_err();
        assert!(err.is_invalid_component());
        assert!(record.component_bits().is_empty());

        store.add_component(record, &position, Box::new(Position(1, 2))).unwrap();
        assert_eq!(store.get::<Position>(record), Some(&Position(1, 2)));
    }

    #[test]
    fn test_pooled_round_trip() {
        let mut entities = EntityDirectory::default();
        let mut store = ComponentStore::default();
        let particle = store.types_mut().register_pooled::<Particle>().unwrap();
        let a = entities.create(None);
        let b = entities.create(None);

        let record = entities.record_mut(a).unwrap();
        let first = store.create::<Particle>(record).unwrap();
        first.life = 99;
        let addr = first as *const Particle;
        assert_eq!(store.remove_component(record, &particle), Ok(true));
        assert_eq!(store.pool().available(&particle), 1);

        let record = entities.record_mut(b).unwrap();
        let second = store.create::<Particle>(record).unwrap();
        assert_eq!(&*second as *const Particle, addr);
        assert_eq!(*second, Particle { life: 0 });
        assert_eq!(store.pool().available(&particle), 0);
    }

    #[test]
    fn test_pooled_create_reclaims_held_instance() {
        let mut entities = EntityDirectory::default();
        let mut store = ComponentStore::default();
        let particle = store.types_mut().register_pooled::<Particle>().unwrap();
        let e = entities.create(None);
        let record = entities.record_mut(e).unwrap();

        store.create::<Particle>(record).unwrap().life = 5;
        let again = store.create::<Particle>(record).unwrap();
        assert_eq!(again.life, 0);
        assert_eq!(store.pool().available(&particle), 0);
        assert_eq!(store.column(&particle).unwrap().occupied().count(), 1);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let mut entities = EntityDirectory::default();
        let mut store = ComponentStore::default();
        let particle = store.types_mut().register_pooled::<Particle>().unwrap();
        let e = entities.create(None);
        let record = entities.record_mut(e).unwrap();
        store.create::<Particle>(record).unwrap();
        store.create::<Position>(record).unwrap();

        store.deleted(e);
        store.deleted(e);
        store.clean(&mut entities).unwrap();
        assert_eq!(store.pool().available(&particle), 1);

        store.clean(&mut entities).unwrap();
        assert_eq!(store.pool().available(&particle), 1);
        assert!(consistent(&store, &entities));
    }

    #[test]
    fn test_components_for() {
        let mut entities = EntityDirectory::default();
        let mut store = ComponentStore::default();
        let e = entities.create(None);
        let record = entities.record_mut(e).unwrap();
        store.add(record, Position(3, 3)).unwrap();
        store.add(record, Label("x")).unwrap();

        let record = entities.record(e).unwrap();
        let mut fill = IndexedBag::new();
        store.components_for(record, &mut fill);
        assert_eq!(fill.len(), 2);
        assert!(fill.iter().any(|c| c.is::<Label>()));
        assert!(fill.iter().any(|c| c.downcast_ref::<Position>() == Some(&Position(3, 3))));
    }
}
