//! Free-lists for pooled component instances.

use crate::bag::IndexedBag;
use crate::component::{Component, ComponentType};

/// Keeps detached instances of pooled component kinds for reuse.
///
/// Instances are reset as they are returned, so anything obtained from the
/// pool is already pristine.
#[derive(Debug, Default)]
pub struct ComponentPool {
    pools: IndexedBag<Vec<Box<dyn Component>>>,
}

impl ComponentPool {
    /// Create a new, empty, pool.
    pub fn new() -> ComponentPool {
        ComponentPool::default()
    }

    /// Get an instance of `component_type`, reusing a freed one when possible
    /// and calling `make` otherwise.
    pub fn obtain(
        &mut self,
        component_type: &ComponentType,
        make: impl FnOnce() -> Box<dyn Component>,
    ) -> Box<dyn Component> {
        let reused = self.pools.safe_get_mut(component_type.index())
            .and_then(|pool| pool.pop());

        match reused {
            Some(component) => {
                tracing::trace!(name = component_type.name(), "reused pooled component");
                component
            }
            None => make(),
        }
    }

    /// Reset `component` and keep it for the next `obtain` of its type.
    pub fn free(&mut self, mut component: Box<dyn Component>, component_type: &ComponentType) {
        component_type.reset(&mut *component);

        self.pools.get_or_insert_with(component_type.index(), Vec::new)
            .push(component);
        tracing::trace!(name = component_type.name(), "freed pooled component");
    }

    /// Return how many free instances of `component_type` are waiting.
    pub fn available(&self, component_type: &ComponentType) -> usize {
        match self.pools.get(component_type.index()) {
            Ok(Some(pool)) => pool.len(),
            _ => 0,
        }
    }
}
