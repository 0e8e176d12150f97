//! The observer protocol and world managers.
//!
//! Managers are bookkeeping collaborators which are told about every entity
//! lifecycle event in the world but never run per-frame work of their own.

use crate::component::AsAny;
use crate::entity::Entity;

/// Receives entity lifecycle notifications from the world.
///
/// Every hook defaults to doing nothing.
pub trait EntityObserver {
    /// The entity was added to the world.
    fn added(&mut self, _entity: Entity) {}

    /// The component composition of the entity changed.
    fn changed(&mut self, _entity: Entity) {}

    /// The entity was deleted from the world.
    fn deleted(&mut self, _entity: Entity) {}

    /// The entity was enabled.
    fn enabled(&mut self, _entity: Entity) {}

    /// The entity was disabled.
    fn disabled(&mut self, _entity: Entity) {}
}

/// A manager is an observer registered with a world.
///
/// The world keeps at most one manager of each concrete type.
pub trait Manager: EntityObserver + AsAny {
    /// Called once by `World::initialize`, before any system is initialized.
    fn initialize(&mut self) {}
}

/// One of the five lifecycle events, used to drive a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notification {
    Added,
    Changed,
    Deleted,
    Enabled,
    Disabled,
}

impl Notification {
    /// Deliver this event for `entity` to `observer`.
    pub fn deliver<O: EntityObserver + ?Sized>(self, observer: &mut O, entity: Entity) {
        match self {
            Notification::Added => observer.added(entity),
            Notification::Changed => observer.changed(entity),
            Notification::Deleted => observer.deleted(entity),
            Notification::Enabled => observer.enabled(entity),
            Notification::Disabled => observer.disabled(entity),
        }
    }
}
