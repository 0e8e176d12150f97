//! Errors raised by the ECS.
//!
//! Every error here is a programmer error (an unregistered type, a handle to
//! an entity which no longer exists, a bad template tag). Nothing in the crate
//! retries.

use crate::component::Taxonomy;
use crate::entity::Entity;

/// The error type for all fallible ECS operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A component type index which was never registered with this world.
    #[error("invalid component: type index {0} was never registered")]
    InvalidComponentIndex(usize),

    /// A component kind was declared with a taxonomy which conflicts with its
    /// existing registration.
    #[error("invalid component: `{name}` is already registered as {taxonomy:?}")]
    InvalidTaxonomy {
        name: &'static str,
        taxonomy: Taxonomy,
    },

    /// A component instance or type record which does not match the expected
    /// component kind.
    #[error("invalid component: expected `{expected}`, found `{found}`")]
    InvalidComponentType {
        expected: &'static str,
        found: &'static str,
    },

    /// A strict index-addressed read past the backing capacity.
    #[error("index {index} is out of range (capacity {capacity})")]
    OutOfRange {
        index: usize,
        capacity: usize,
    },

    /// No entity template is registered under the given tag.
    #[error("no entity template registered under `{0}`")]
    UnknownTemplate(String),

    /// The entity handle refers to an entity which is not alive in this world.
    #[error("{0} is not alive in this world")]
    DeadEntity(Entity),

    /// A configuration document could not be parsed.
    #[error("invalid world configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if this error belongs to the invalid-component class.
    pub fn is_invalid_component(&self) -> bool {
        matches!(self,
            Error::InvalidComponentIndex(_)
            | Error::InvalidTaxonomy { .. }
            | Error::InvalidComponentType { .. })
    }
}

/// A `Result` defaulting to the crate `Error`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
