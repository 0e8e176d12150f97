//! An entity component system.
//!
//! Entities are bare ids. Components are attached to them and stored in
//! per-type columns. Systems declare an `Aspect` (the component types they
//! need, refuse, or accept any of) and the `World` keeps each system's set of
//! matching entities up to date as entities are added, changed, enabled,
//! disabled and deleted. Lifecycle changes are queued and applied once per
//! frame, by `World::process`, before any system runs.

pub use aspect::{Aspect, AspectBuilder};
pub use bag::IndexedBag;
pub use bits::BitVector;
pub use component::{Component, ComponentType, PooledComponent, Taxonomy};
pub use config::WorldConfig;
pub use entity::{Entity, EntityDirectory, EntityRecord};
pub use error::{Error, Result};
pub use manager::{EntityObserver, Manager};
pub use system::{
    DelayedProcessor,
    DelayedSystem,
    EntityProcessor,
    EntitySystem,
    IntervalSystem,
    ProcessingSystem,
    VoidProcessor,
    VoidSystem,
};
pub use world::{ComponentMapper, EntityMut, EntityTemplate, World};

pub mod aspect;
pub mod bag;
pub mod bits;
pub mod component;
pub mod component_store;
pub mod config;
pub mod entity;
pub mod error;
pub mod manager;
pub mod managers;
pub mod pool;
pub mod registry;
pub mod system;
pub mod world;
