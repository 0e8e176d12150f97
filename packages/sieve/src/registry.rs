//! Stable indexing of component kinds.

use std::any::{self, TypeId};
use std::collections::HashMap;

use crate::aspect::AspectBuilder;
use crate::component::{Component, ComponentType, PooledComponent, Taxonomy};
use crate::error::{Error, Result};

/// Assigns each component kind a stable index and a taxonomy.
///
/// Indices are handed out in first-seen order and are never reused. A registry
/// belongs to one world; a fresh registry starts a fresh numbering.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    by_type: HashMap<TypeId, usize>,
    types: Vec<ComponentType>,
}

impl TypeRegistry {
    /// Create a new, empty, registry.
    pub fn new() -> TypeRegistry {
        TypeRegistry::default()
    }

    /// Get the record for `T`, registering it as a basic component if this is
    /// the first time it has been seen.
    pub fn type_for<T: Component>(&mut self) -> ComponentType {
        if let Some(existing) = self.get::<T>() {
            return existing;
        }

        self.insert(ComponentType::basic::<T>(self.types.len()))
    }

    /// Declare `T` as a pooled component kind.
    ///
    /// This must happen before `T` is first used, otherwise `T` will already
    /// be registered as a basic component and this fails.
    pub fn register_pooled<T: PooledComponent>(&mut self) -> Result<ComponentType> {
        match self.get::<T>() {
            Some(existing) if existing.is_pooled() => Ok(existing),
            Some(existing) => Err(Error::InvalidTaxonomy {
                name: any::type_name::<T>(),
                taxonomy: existing.taxonomy(),
            }),
            None => Ok(self.insert(ComponentType::pooled::<T>(self.types.len()))),
        }
    }

    fn insert(&mut self, component_type: ComponentType) -> ComponentType {
        tracing::debug!(
            name = component_type.name(),
            index = component_type.index(),
            taxonomy = ?component_type.taxonomy(),
            "registered component type");

        self.by_type.insert(component_type.type_id(), component_type.index());
        self.types.push(component_type);
        component_type
    }

    /// Get the record for `T` if it has been registered.
    pub fn get<T: Component>(&self) -> Option<ComponentType> {
        self.by_type.get(&TypeId::of::<T>())
            .map(|index| self.types[*index])
    }

    /// Get the index of `T`, registering it if needed.
    pub fn index_for<T: Component>(&mut self) -> usize {
        self.type_for::<T>().index()
    }

    /// Look up a record by its index.
    pub fn type_at(&self, index: usize) -> Result<ComponentType> {
        self.types.get(index)
            .copied()
            .ok_or(Error::InvalidComponentIndex(index))
    }

    /// Get the taxonomy of the type registered at `index`.
    pub fn taxonomy(&self, index: usize) -> Result<Taxonomy> {
        self.type_at(index).map(|t| t.taxonomy())
    }

    /// Check that `component_type` was issued by this registry.
    pub fn validate(&self, component_type: &ComponentType) -> Result<ComponentType> {
        let registered = self.type_at(component_type.index())?;
        if registered != *component_type {
            return Err(Error::InvalidComponentType {
                expected: registered.name(),
                found: component_type.name(),
            });
        }
        Ok(registered)
    }

    /// Start building an aspect against this registry.
    pub fn aspect(&mut self) -> AspectBuilder<'_> {
        AspectBuilder::new(self)
    }

    /// Return the number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types have been registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over all registered types in index order.
    pub fn iter(&self) -> impl Iterator<Item=&ComponentType> + '_ {
        self.types.iter()
    }
}
