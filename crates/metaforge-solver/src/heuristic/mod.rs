//! Movements and neighborhoods as the search loops see them.
//!
//! - [`TrackedNeighborhood`] wraps a problem [`Neighborhood`] with telemetry,
//!   an optional stop criteria and the apply/unapply state machine
//! - [`PendingMove`] and [`AppliedMove`] encode the movement lifecycle in
//!   the type system
//! - [`CompositeMovement`] chains sub-movements into one
//! - [`NeighborhoodSelection`] decides which neighborhood is consulted next
//!
//! [`Neighborhood`]: metaforge_core::Neighborhood

mod applied;
mod composite;
mod selection;
mod tracked;

pub use applied::{AppliedMove, PendingMove};
pub use composite::CompositeMovement;
pub use selection::{NeighborhoodSelection, SelectionStrategy};
pub use tracked::TrackedNeighborhood;

#[cfg(test)]
mod tests;
