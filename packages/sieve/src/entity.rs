//! Entity identities and their bookkeeping.
//!
//! An `Entity` is just a handle: the id, which is recycled once the entity is
//! deleted, and a UUID which is not. The state of the entity (the component
//! and system bitsets) lives in the `EntityRecord` owned by the world's
//! `EntityDirectory`.

use std::fmt::{self, Display, Formatter};

use uuid::Uuid;

use crate::bag::IndexedBag;
use crate::bits::BitVector;
use crate::manager::EntityObserver;

/// A handle to an entity in a world.
///
/// Two handles with the same id but different UUIDs refer to different
/// incarnations of that id; only the newest one is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: usize,
    uuid: Uuid,
}

impl Entity {
    pub(crate) fn new(id: usize) -> Entity {
        Entity {
            id,
            uuid: Uuid::new_v4(),
        }
    }

    /// Return the id of this entity.
    ///
    /// Ids are unique amongst live entities but are reused after deletion.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Return the identity of this incarnation of the entity.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "entity {} ({})", self.id, self.uuid)
    }
}

/// The state the world keeps for each live entity.
#[derive(Debug)]
pub struct EntityRecord {
    entity: Entity,
    name: Option<String>,
    component_bits: BitVector,
    system_bits: BitVector,
}

impl EntityRecord {
    fn new(entity: Entity, name: Option<String>) -> EntityRecord {
        EntityRecord {
            entity,
            name,
            component_bits: BitVector::new(),
            system_bits: BitVector::new(),
        }
    }

    /// Return the handle for this record.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Return the debug name given at creation, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The indices of the component types attached to the entity.
    pub fn component_bits(&self) -> &BitVector {
        &self.component_bits
    }

    /// The indices of the systems the entity is active in.
    pub fn system_bits(&self) -> &BitVector {
        &self.system_bits
    }

    pub(crate) fn component_bits_mut(&mut self) -> &mut BitVector {
        &mut self.component_bits
    }

    pub(crate) fn system_bits_mut(&mut self) -> &mut BitVector {
        &mut self.system_bits
    }
}

/// A LIFO recycler of entity ids.
#[derive(Debug, Default)]
pub(crate) struct IdentifierPool {
    ids: Vec<usize>,
    next: usize,
}

impl IdentifierPool {
    pub fn check_out(&mut self) -> usize {
        match self.ids.pop() {
            Some(id) => id,
            None => {
                let id = self.next;
                self.next += 1;
                id
            }
        }
    }

    pub fn check_in(&mut self, id: usize) {
        self.ids.push(id);
    }
}

/// Allocates entity ids and tracks which entities are active and enabled.
#[derive(Debug)]
pub struct EntityDirectory {
    records: IndexedBag<EntityRecord>,
    active: BitVector,
    disabled: BitVector,
    ids: IdentifierPool,
    released: Vec<usize>,
    releasing: BitVector,
    active_count: usize,
    created: usize,
    added: usize,
    deleted: usize,
}

impl EntityDirectory {
    /// Create a new directory with room for `capacity` entities.
    pub fn with_capacity(capacity: usize) -> EntityDirectory {
        EntityDirectory {
            records: IndexedBag::with_capacity(capacity),
            active: BitVector::with_capacity(capacity),
            disabled: BitVector::with_capacity(capacity),
            ids: IdentifierPool::default(),
            released: Vec::new(),
            releasing: BitVector::new(),
            active_count: 0,
            created: 0,
            added: 0,
            deleted: 0,
        }
    }

    /// Issue a new entity, reusing a recycled id if one is available.
    ///
    /// The record for a reused id always starts out with no components, no
    /// system membership and a fresh UUID.
    pub fn create(&mut self, name: Option<String>) -> Entity {
        let entity = Entity::new(self.ids.check_out());
        self.records.insert(entity.id(), EntityRecord::new(entity, name));
        self.created += 1;

        tracing::trace!(id = entity.id(), "checked out entity id");
        entity
    }

    /// Returns true if `entity` is the current incarnation of its id.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.record(entity).is_some()
    }

    /// Get the record of a live entity.
    pub fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        self.record_by_id(entity.id())
            .filter(|r| r.entity == entity)
    }

    /// Get the record of a live entity mutably.
    pub fn record_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        match self.records.get_mut(entity.id()) {
            Ok(Some(record)) if record.entity == entity => Some(record),
            _ => None,
        }
    }

    /// Get the record currently occupying `id`.
    pub fn record_by_id(&self, id: usize) -> Option<&EntityRecord> {
        self.records.get(id).ok().flatten()
    }

    /// Get the handle of the entity with `id`, if it has been added to the
    /// world and not yet deleted.
    pub fn entity(&self, id: usize) -> Option<Entity> {
        if !self.is_active(id) {
            return None;
        }
        self.record_by_id(id).map(|r| r.entity)
    }

    /// Returns true if the entity with `id` has been added and not deleted.
    pub fn is_active(&self, id: usize) -> bool {
        self.active.get(id)
    }

    /// Returns true unless the entity with `id` has been disabled.
    pub fn is_enabled(&self, id: usize) -> bool {
        !self.disabled.get(id)
    }

    /// Iterate over every live record, including entities not yet added.
    pub fn records(&self) -> impl Iterator<Item=&EntityRecord> + '_ {
        self.records.occupied().map(|(_, r)| r)
    }

    /// Return how many entities are currently active.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Return how many entities have been created since the world started.
    pub fn total_created(&self) -> usize {
        self.created
    }

    /// Return how many entities have been added since the world started.
    pub fn total_added(&self) -> usize {
        self.added
    }

    /// Return how many entities have been deleted since the world started.
    pub fn total_deleted(&self) -> usize {
        self.deleted
    }

    /// Drop the records of deleted entities and recycle their ids.
    ///
    /// This must only run once their components have been purged.
    pub fn release_deleted(&mut self) {
        for id in self.released.drain(..) {
            self.releasing.clear(id);
            self.records.take(id);
            self.ids.check_in(id);
            tracing::trace!(id, "checked in entity id");
        }
    }
}

impl Default for EntityDirectory {
    fn default() -> EntityDirectory {
        EntityDirectory::with_capacity(64)
    }
}

impl EntityObserver for EntityDirectory {
    fn added(&mut self, entity: Entity) {
        if !self.is_alive(entity) || self.active.get(entity.id()) {
            return;
        }

        self.active.set(entity.id());
        self.active_count += 1;
        self.added += 1;
    }

    fn enabled(&mut self, entity: Entity) {
        self.disabled.clear(entity.id());
    }

    fn disabled(&mut self, entity: Entity) {
        self.disabled.set(entity.id());
    }

    fn deleted(&mut self, entity: Entity) {
        let id = entity.id();
        if !self.is_alive(entity) || self.releasing.get(id) {
            return;
        }

        if self.active.get(id) {
            self.active.clear(id);
            self.active_count -= 1;
        }
        self.disabled.clear(id);
        self.deleted += 1;
        self.releasing.set(id);
        self.released.push(id);
    }
}
