//! Neighborhood wrapper carrying identity, telemetry and lifecycle checks.

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Instant;

use metaforge_core::{EntityId, Evaluation, MetaforgeError, Neighborhood, Result, ThreadRandom};
use tracing::warn;

use super::applied::{AppliedMove, PendingMove};
use crate::stop::StopCriteria;
use crate::telemetry::{EfficiencyReport, Telemetry, TelemetryKind, TelemetrySink};

/// A [`Neighborhood`] as driven by the search loops.
///
/// The wrapper enforces the movement lifecycle:
///
/// - `next_move` before the first `build` fails with `Exhausted`
/// - asking again after the sequence returned `None` fails with `Exhausted`
///   until the neighborhood is rebuilt
/// - a movement applied through [`TrackedNeighborhood::apply`] must be
///   unapplied or accepted before the next one is requested
///
/// An optional stop criteria ends the candidate sequence early; it is
/// counted once per yielded movement and reset on every build.
pub struct TrackedNeighborhood<S> {
    id: EntityId,
    inner: Box<dyn Neighborhood<S>>,
    telemetry: Telemetry,
    stop: Option<Box<dyn StopCriteria>>,
    built: bool,
    exhausted: bool,
    outstanding: bool,
}

impl<S: 'static> TrackedNeighborhood<S> {
    pub fn new(inner: impl Neighborhood<S> + 'static) -> Self {
        Self::from_boxed(Box::new(inner))
    }

    pub fn from_boxed(inner: Box<dyn Neighborhood<S>>) -> Self {
        Self {
            id: EntityId::next(),
            inner,
            telemetry: Telemetry::default(),
            stop: None,
            built: false,
            exhausted: false,
            outstanding: false,
        }
    }

    /// Ends each candidate sequence once `stop` fires.
    pub fn with_stop_criteria(mut self, stop: Box<dyn StopCriteria>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Telemetry::new(sink);
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    pub fn report(&self) -> &EfficiencyReport {
        self.telemetry.report()
    }

    /// True while a movement is applied and not yet resolved.
    pub fn has_outstanding_move(&self) -> bool {
        self.outstanding
    }

    /// Builds candidates for `solution`; false if none can be built.
    pub fn build(&mut self, random: &ThreadRandom<'_>, solution: &S) -> Result<bool> {
        if self.outstanding {
            return Err(self.lifecycle_error("rebuilt while a movement is applied"));
        }
        let name = self.inner.name();
        self.telemetry
            .notify(name, self.id, TelemetryKind::SearchStart, None, &[]);
        if let Some(stop) = &self.stop {
            stop.reset();
        }
        let started = Instant::now();
        let built = self.inner.build(random, solution);
        self.telemetry.report.record_search(started.elapsed());
        self.telemetry
            .notify(name, self.id, TelemetryKind::SearchEnd, None, &[]);

        let built = built?;
        self.built = true;
        self.exhausted = !built;
        Ok(built)
    }

    /// Yields the next candidate, or `None` once the sequence is exhausted.
    pub fn next_move(&mut self, random: &ThreadRandom<'_>) -> Result<Option<PendingMove<S>>> {
        if !self.built || self.exhausted {
            return Err(MetaforgeError::exhausted(self.inner.name()));
        }
        if self.outstanding {
            return Err(self.lifecycle_error("queried while a movement is applied"));
        }
        if self.stop.as_ref().is_some_and(|stop| stop.stop()) {
            self.exhausted = true;
            return Ok(None);
        }
        match self.inner.next_move(random)? {
            Some(movement) => {
                if let Some(stop) = &self.stop {
                    stop.increment_counter();
                }
                self.telemetry.report.record_move_yielded();
                Ok(Some(PendingMove::new(movement)))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Applies `pending` to `solution`.
    ///
    /// Returns `None` when the movement was not applicable; the solution is
    /// then unchanged and the movement is dropped.
    pub fn apply(
        &mut self,
        pending: PendingMove<S>,
        solution: &mut S,
    ) -> Result<Option<AppliedMove<S>>> {
        let PendingMove { mut movement } = pending;
        let name = self.inner.name();
        let movement_name = movement.name();
        self.telemetry
            .notify(name, self.id, TelemetryKind::ApplyStart, Some(movement_name), &[]);
        let started = Instant::now();
        let applied = match movement.apply(solution) {
            Ok(applied) => applied,
            Err(err) => {
                warn!(
                    event = "movement_failed",
                    neighborhood = name,
                    movement = movement_name,
                    error = %err,
                );
                self.telemetry.report.record_apply(false, started.elapsed());
                self.telemetry
                    .notify(name, self.id, TelemetryKind::ApplyFailed, Some(movement_name), &[]);
                return Err(err);
            }
        };
        self.telemetry.report.record_apply(applied, started.elapsed());
        if applied {
            self.telemetry
                .notify(name, self.id, TelemetryKind::ApplyEnd, Some(movement_name), &[]);
            self.outstanding = true;
            Ok(Some(AppliedMove { movement }))
        } else {
            self.telemetry
                .notify(name, self.id, TelemetryKind::ApplyFailed, Some(movement_name), &[]);
            Ok(None)
        }
    }

    /// Reverts `applied`; `discarded` is the evaluation the solution had
    /// while the movement was applied.
    pub fn unapply(
        &mut self,
        applied: AppliedMove<S>,
        solution: &mut S,
        discarded: &Evaluation,
    ) -> Result<()> {
        let AppliedMove { mut movement } = applied;
        let name = self.inner.name();
        let movement_name = movement.name();
        self.telemetry
            .notify(name, self.id, TelemetryKind::UnapplyStart, Some(movement_name), &[]);
        let started = Instant::now();
        let result = movement.unapply(solution);
        self.outstanding = false;
        let infeasible: Vec<_> = discarded.infeasible_kinds().cloned().collect();
        self.telemetry
            .report
            .record_unapply(&infeasible, started.elapsed());
        self.telemetry.notify(
            name,
            self.id,
            TelemetryKind::UnapplyEnd,
            Some(movement_name),
            &infeasible,
        );
        result
    }

    /// Commits `applied`; `improvement` is the objective gain it brought.
    pub fn accept(&mut self, applied: AppliedMove<S>, improvement: f64) {
        drop(applied);
        self.outstanding = false;
        self.inner.accept_movement();
        self.telemetry.report.record_accept(improvement);
    }

    /// Credits an improvement found by a movement that is unapplied
    /// afterwards, as best-improvement scans do.
    pub fn record_improvement(&mut self, improvement: f64) {
        self.telemetry.report.record_accept(improvement);
    }

    /// Drops cached candidates after `solution` changed elsewhere.
    pub fn reset(&mut self, solution: &S) {
        self.inner.reset(solution);
        self.built = false;
        self.exhausted = false;
    }

    fn lifecycle_error(&self, message: &str) -> MetaforgeError {
        MetaforgeError::movement(self.inner.name(), message)
    }
}

/// Deep copy with a new identity and empty counters.
impl<S: 'static> Clone for TrackedNeighborhood<S> {
    fn clone(&self) -> Self {
        Self {
            id: EntityId::next(),
            inner: self.inner.box_clone(),
            telemetry: self.telemetry.fresh(),
            stop: self.stop.as_ref().map(|stop| stop.box_clone()),
            built: false,
            exhausted: false,
            outstanding: false,
        }
    }
}

impl<S> Debug for TrackedNeighborhood<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedNeighborhood")
            .field("id", &self.id)
            .field("inner", &self.inner)
            .field("built", &self.built)
            .field("exhausted", &self.exhausted)
            .field("outstanding", &self.outstanding)
            .finish()
    }
}
