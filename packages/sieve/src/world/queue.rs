use uuid::Uuid;

use crate::bag::IndexedBag;
use crate::entity::Entity;

/// A buffer of entities waiting for one lifecycle notification.
///
/// The queue keeps the order entities were pushed in, and holds each handle at
/// most once. Pushing a handle which is already queued does nothing, so an
/// entity deleted twice in a frame is only deleted once.
#[derive(Debug, Default)]
pub(crate) struct EntityQueue {
    entities: Vec<Entity>,
    queued: IndexedBag<Uuid>,
}

impl EntityQueue {
    /// Create a new, empty, queue with room for ids below `capacity`.
    pub fn with_capacity(capacity: usize) -> EntityQueue {
        EntityQueue {
            entities: Vec::with_capacity(capacity),
            queued: IndexedBag::with_capacity(capacity),
        }
    }

    /// Queue `entity`. Returns false if it was already queued.
    pub fn push(&mut self, entity: Entity) -> bool {
        if self.contains(entity) {
            return false;
        }

        self.queued.insert(entity.id(), entity.uuid());
        self.entities.push(entity);
        true
    }

    /// Returns true if `entity` is queued.
    pub fn contains(&self, entity: Entity) -> bool {
        // Only the latest incarnation pushed for an id is remembered.
        self.queued.get(entity.id()).ok().flatten() == Some(&entity.uuid())
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Return the number of queued entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Move every queued entity, in order, onto the end of `out`.
    pub fn drain_into(&mut self, out: &mut Vec<Entity>) {
        out.append(&mut self.entities);
        self.queued.clear();
    }
}
