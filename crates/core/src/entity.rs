//! Entity traits: identity, and ownership by the identity that created it.

use crate::UserId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity that belongs to exactly one user.
///
/// The owner is assigned once, at creation, from the authenticated creator.
/// Generic update paths must never reassign it.
pub trait Owned: Entity {
    fn owner_id(&self) -> UserId;
}
