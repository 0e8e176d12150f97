//! Bookkeeping managers built on the observer protocol.

pub use group::GroupManager;
pub use tag::TagManager;

mod group;
mod tag;
