//! Base definitions for components.
//!
//! All entities in this library are built out of components. There is no intrinsic
//! value to an entity. This module provides means of defining components and
//! describing component types.
//!
//! Each component kind is allocated an index by the `TypeRegistry` of the world
//! it is used in. There is a macro (`component`) to implement the `Component`
//! trait on your types.

use std::any::{self, Any, TypeId};
use std::cmp::{Ord, Ordering};
use std::fmt::{self, Debug, Formatter};

/// Dynamic access to the concrete type behind a trait object.
///
/// This is implemented for every `'static` type.
pub trait AsAny: Any {
    /// Return this value as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Return this value as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert a boxed value into `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Return the name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// The component trait is implemented on all component types.
///
/// Use the `component!` macro to implement it.
pub trait Component: AsAny + Debug {}

impl<'a> dyn Component + 'a {
    /// Returns true if the boxed component is a `T`.
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a concrete component type.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably downcast to a concrete component type.
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// A component whose instances are recycled through a free-list.
///
/// When a pooled component is detached it is `reset()` and kept for the next
/// attach of the same type, instead of being dropped.
pub trait PooledComponent: Component + Default {
    /// Return the component to a pristine state.
    fn reset(&mut self);
}

/// How instances of a component type are managed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Taxonomy {
    /// Freshly allocated on attach and dropped on detach.
    Basic,
    /// Recycled through the world's `ComponentPool`.
    Pooled,
}

/// The registration record of a component kind in one world.
///
/// The index is assigned on first sight and never changes or gets reused for
/// the lifetime of the registry.
#[derive(Clone, Copy)]
pub struct ComponentType {
    index: usize,
    type_id: TypeId,
    name: &'static str,
    taxonomy: Taxonomy,
    reset: fn(&mut dyn Component),
}

impl ComponentType {
    /// Create a record for a basic component kind.
    pub(crate) fn basic<T: Component>(index: usize) -> ComponentType {
        fn keep(_: &mut dyn Component) {}

        ComponentType {
            index,
            type_id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            taxonomy: Taxonomy::Basic,
            reset: keep,
        }
    }

    /// Create a record for a pooled component kind.
    pub(crate) fn pooled<T: PooledComponent>(index: usize) -> ComponentType {
        fn reset<T: PooledComponent>(component: &mut dyn Component) {
            if let Some(component) = component.downcast_mut::<T>() {
                component.reset();
            }
        }

        ComponentType {
            index,
            type_id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            taxonomy: Taxonomy::Pooled,
            reset: reset::<T>,
        }
    }

    /// Return the index of this component type.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Return the `TypeId` of the component kind.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Return the name of the component kind.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return how instances of this type are managed.
    pub fn taxonomy(&self) -> Taxonomy {
        self.taxonomy
    }

    /// Returns true if instances of this type are pooled.
    pub fn is_pooled(&self) -> bool {
        self.taxonomy == Taxonomy::Pooled
    }

    /// Returns true if `component` is an instance of this type.
    pub fn describes(&self, component: &dyn Component) -> bool {
        component.as_any().type_id() == self.type_id
    }

    /// Reset a pooled instance of this type. Basic types are left untouched.
    pub(crate) fn reset(&self, component: &mut dyn Component) {
        (self.reset)(component)
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &ComponentType) -> bool {
        self.index == other.index && self.type_id == other.type_id
    }
}

impl Eq for ComponentType {}

impl PartialOrd for ComponentType {
    fn partial_cmp(&self, other: &ComponentType) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComponentType {
    fn cmp(&self, other: &ComponentType) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl Debug for ComponentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType[{}]({}, {:?})", self.name, self.index, self.taxonomy)
    }
}

/// Implement the `Component` trait on one or more types.
///
/// Component types must be `'static` and implement `Debug`.
#[macro_export]
macro_rules! component {
    ($($i:ty),+ $(,)?) => {
        $(
            impl $crate::component::Component for $i {}
        )+
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_downcast() {
        #[derive(Debug, Default, PartialEq)]
        struct A(u8);
        #[derive(Debug, Default)]
        struct B;

        component!(A, B);

        let mut boxed: Box<dyn Component> = Box::new(A(7));
        assert!(boxed.is::<A>());
        assert!(!boxed.is::<B>());
        assert_eq!(boxed.downcast_ref::<A>(), Some(&A(7)));
        assert!(boxed.downcast_ref::<B>().is_none());

        boxed.downcast_mut::<A>().unwrap().0 = 9;
        assert_eq!(boxed.downcast_ref::<A>(), Some(&A(9)));
        assert_eq!((*boxed).type_name(), any::type_name::<A>());
    }

    #[test]
    fn test_reset_hook() {
        #[derive(Debug, Default, PartialEq)]
        struct Ammo(u32);

        component!(Ammo);

        impl PooledComponent for Ammo {
            fn reset(&mut self) {
                self.0 = 0;
            }
        }

        let pooled = ComponentType::pooled::<Ammo>(3);
        let basic = ComponentType::basic::<Ammo>(4);
        assert_eq!(pooled.taxonomy(), Taxonomy::Pooled);
        assert_eq!(basic.taxonomy(), Taxonomy::Basic);
        assert_ne!(pooled, basic);

        let mut ammo = Ammo(12);
        assert!(pooled.describes(&ammo));

        basic.reset(&mut ammo);
        assert_eq!(ammo, Ammo(12));

        pooled.reset(&mut ammo);
        assert_eq!(ammo, Ammo(0));
    }
}
