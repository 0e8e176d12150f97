use std::collections::HashMap;

use crate::entity::Entity;
use crate::manager::{EntityObserver, Manager};

/// Names single entities with unique tags, such as "player" or "camera".
///
/// A tag points at one entity and an entity carries at most one tag. Tags are
/// dropped when their entity is deleted.
#[derive(Debug, Default)]
pub struct TagManager {
    entities_by_tag: HashMap<String, Entity>,
    tags_by_entity: HashMap<Entity, String>,
}

impl TagManager {
    /// Create a new, empty, tag manager.
    pub fn new() -> TagManager {
        TagManager::default()
    }

    /// Tag `entity` with `tag`, replacing whatever either was bound to before.
    pub fn register(&mut self, tag: impl Into<String>, entity: Entity) {
        let tag = tag.into();
        self.unregister(&tag);
        if let Some(old) = self.tags_by_entity.remove(&entity) {
            self.entities_by_tag.remove(&old);
        }

        self.entities_by_tag.insert(tag.clone(), entity);
        self.tags_by_entity.insert(entity, tag);
    }

    /// Remove `tag`, returning the entity it pointed at.
    pub fn unregister(&mut self, tag: &str) -> Option<Entity> {
        let entity = self.entities_by_tag.remove(tag)?;
        self.tags_by_entity.remove(&entity);
        Some(entity)
    }

    /// Returns true if `tag` points at an entity.
    pub fn is_registered(&self, tag: &str) -> bool {
        self.entities_by_tag.contains_key(tag)
    }

    /// Get the entity tagged with `tag`.
    pub fn entity(&self, tag: &str) -> Option<Entity> {
        self.entities_by_tag.get(tag).copied()
    }

    /// Get the tag of `entity`.
    pub fn tag(&self, entity: Entity) -> Option<&str> {
        self.tags_by_entity.get(&entity).map(String::as_str)
    }

    /// Iterate over every registered tag.
    pub fn registered_tags(&self) -> impl Iterator<Item=&str> + '_ {
        self.entities_by_tag.keys().map(String::as_str)
    }
}

impl EntityObserver for TagManager {
    fn deleted(&mut self, entity: Entity) {
        if let Some(tag) = self.tags_by_entity.remove(&entity) {
            self.entities_by_tag.remove(&tag);
        }
    }
}

impl Manager for TagManager {}
