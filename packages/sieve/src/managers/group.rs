use std::collections::HashMap;

use crate::entity::Entity;
use crate::manager::{EntityObserver, Manager};

/// Sorts entities into named groups.
///
/// An entity can belong to any number of groups. Membership is dropped when
/// the entity is deleted.
#[derive(Debug, Default)]
pub struct GroupManager {
    entities_by_group: HashMap<String, Vec<Entity>>,
    groups_by_entity: HashMap<Entity, Vec<String>>,
}

impl GroupManager {
    /// Create a new, empty, group manager.
    pub fn new() -> GroupManager {
        GroupManager::default()
    }

    /// Put `entity` in `group`.
    pub fn add(&mut self, entity: Entity, group: impl Into<String>) {
        let group = group.into();
        if self.is_in_group(entity, &group) {
            return;
        }

        self.entities_by_group.entry(group.clone()).or_default().push(entity);
        self.groups_by_entity.entry(entity).or_default().push(group);
    }

    /// Take `entity` out of `group`.
    pub fn remove(&mut self, entity: Entity, group: &str) {
        if let Some(entities) = self.entities_by_group.get_mut(group) {
            entities.retain(|e| *e != entity);
        }
        if let Some(groups) = self.groups_by_entity.get_mut(&entity) {
            groups.retain(|g| g != group);
            if groups.is_empty() {
                self.groups_by_entity.remove(&entity);
            }
        }
    }

    /// Take `entity` out of every group.
    pub fn remove_from_all_groups(&mut self, entity: Entity) {
        let groups = match self.groups_by_entity.remove(&entity) {
            Some(groups) => groups,
            None => return,
        };

        for group in groups {
            if let Some(entities) = self.entities_by_group.get_mut(&group) {
                entities.retain(|e| *e != entity);
            }
        }
    }

    /// Return the members of `group`.
    pub fn entities(&self, group: &str) -> &[Entity] {
        self.entities_by_group.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Return the groups `entity` belongs to.
    pub fn groups(&self, entity: Entity) -> &[String] {
        self.groups_by_entity.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if `entity` belongs to any group.
    pub fn is_in_any_group(&self, entity: Entity) -> bool {
        !self.groups(entity).is_empty()
    }

    /// Returns true if `entity` belongs to `group`.
    pub fn is_in_group(&self, entity: Entity, group: &str) -> bool {
        self.groups(entity).iter().any(|g| g == group)
    }
}

impl EntityObserver for GroupManager {
    fn deleted(&mut self, entity: Entity) {
        self.remove_from_all_groups(entity);
    }
}

impl Manager for GroupManager {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::world::World;

    #[test]
    fn test_membership() {
        let mut world = World::new();
        world.set_manager(GroupManager::new());
        let a = world.create_entity();
        let b = world.create_entity();

        let groups = world.manager_mut::<GroupManager>().unwrap();
        groups.add(a, "enemies");
        groups.add(a, "enemies");
        groups.add(a, "flying");
        groups.add(b, "enemies");
        assert_eq!(groups.entities("enemies"), &[a, b]);
        assert_eq!(groups.groups(a), &["enemies".to_string(), "flying".to_string()]);
        assert!(groups.is_in_group(a, "flying"));

        groups.remove(a, "flying");
        assert!(!groups.is_in_group(a, "flying"));
        assert!(groups.entities("flying").is_empty());
        assert!(groups.entities("nobody").is_empty());

        world.delete_entity(a);
        world.process().unwrap();
        let groups = world.manager::<GroupManager>().unwrap();
        assert!(!groups.is_in_any_group(a));
        assert_eq!(groups.entities("enemies"), &[b]);
    }
}
