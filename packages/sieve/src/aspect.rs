//! Declarative entity queries.
//!
//! An `Aspect` is compiled down to three bitsets over component type indices
//! so matching an entity is a handful of word operations.

use crate::bits::BitVector;
use crate::component::Component;
use crate::registry::TypeRegistry;

/// A predicate over the component types attached to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aspect {
    all: BitVector,
    exclude: BitVector,
    one: BitVector,
}

impl Aspect {
    /// The empty aspect. It matches no entity at all.
    pub fn empty() -> Aspect {
        Aspect::default()
    }

    /// The types an entity must have every one of.
    pub fn all_set(&self) -> &BitVector {
        &self.all
    }

    /// The types an entity must have none of.
    pub fn exclusion_set(&self) -> &BitVector {
        &self.exclude
    }

    /// The types an entity must have at least one of.
    pub fn one_set(&self) -> &BitVector {
        &self.one
    }

    /// Returns true if this aspect requires nothing, and therefore matches
    /// nothing.
    pub fn is_dummy(&self) -> bool {
        self.all.is_empty() && self.one.is_empty()
    }

    /// Test the component bits of an entity against this aspect.
    ///
    /// When the `one` set is non-empty it decides the outcome on its own,
    /// overriding the verdict of `all` and `exclude`.
    pub fn matches(&self, component_bits: &BitVector) -> bool {
        if self.is_dummy() {
            return false;
        }

        let mut interested = true;
        if !self.all.is_empty() {
            interested = component_bits.contains_all(&self.all);
        }
        if !self.exclude.is_empty() && interested {
            interested = !self.exclude.intersects(component_bits);
        }
        if !self.one.is_empty() {
            interested = self.one.intersects(component_bits);
        }
        interested
    }
}

/// Builds an `Aspect`, registering every type it mentions.
///
/// ```ignore
/// let aspect = world.aspect().all::<Position>().exclude::<Frozen>().build();
/// ```
pub struct AspectBuilder<'r> {
    types: &'r mut TypeRegistry,
    aspect: Aspect,
}

impl<'r> AspectBuilder<'r> {
    pub(crate) fn new(types: &'r mut TypeRegistry) -> AspectBuilder<'r> {
        AspectBuilder {
            types,
            aspect: Aspect::empty(),
        }
    }

    /// Require `T`.
    pub fn all<T: Component>(mut self) -> Self {
        let index = self.types.index_for::<T>();
        self.aspect.all.set(index);
        self
    }

    /// Reject entities holding `T`.
    pub fn exclude<T: Component>(mut self) -> Self {
        let index = self.types.index_for::<T>();
        self.aspect.exclude.set(index);
        self
    }

    /// Accept entities holding `T`, or any other type given to `one`.
    pub fn one<T: Component>(mut self) -> Self {
        let index = self.types.index_for::<T>();
        self.aspect.one.set(index);
        self
    }

    /// Finish building.
    pub fn build(self) -> Aspect {
        self.aspect
    }
}
