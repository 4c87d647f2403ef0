//! Typestate wrappers for the movement lifecycle.
//!
//! A [`PendingMove`] has been yielded but not applied. Applying it through
//! [`TrackedNeighborhood::apply`] yields an [`AppliedMove`], which has to be
//! consumed by exactly one of [`TrackedNeighborhood::unapply`] or
//! [`TrackedNeighborhood::accept`].
//!
//! [`TrackedNeighborhood::apply`]: super::TrackedNeighborhood::apply
//! [`TrackedNeighborhood::unapply`]: super::TrackedNeighborhood::unapply
//! [`TrackedNeighborhood::accept`]: super::TrackedNeighborhood::accept

use std::fmt;

use metaforge_core::BoxedMovement;

/// A movement that has been yielded and not applied yet.
pub struct PendingMove<S> {
    pub(super) movement: BoxedMovement<S>,
}

impl<S> PendingMove<S> {
    pub(super) fn new(movement: BoxedMovement<S>) -> Self {
        Self { movement }
    }

    /// Expected objective change, available before applying.
    pub fn cost(&self) -> f64 {
        self.movement.cost()
    }

    pub fn name(&self) -> &'static str {
        self.movement.name()
    }
}

impl<S> fmt::Debug for PendingMove<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMove")
            .field("movement", &self.movement)
            .finish()
    }
}

/// A movement currently applied to its solution.
#[must_use = "an applied movement must be unapplied or accepted"]
pub struct AppliedMove<S> {
    pub(super) movement: BoxedMovement<S>,
}

impl<S> AppliedMove<S> {
    pub fn cost(&self) -> f64 {
        self.movement.cost()
    }

    pub fn name(&self) -> &'static str {
        self.movement.name()
    }
}

impl<S> fmt::Debug for AppliedMove<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppliedMove")
            .field("movement", &self.movement)
            .finish()
    }
}
