//! Efficiency telemetry for neighborhoods and genetic operators.
//!
//! Every tracked component keeps an [`EfficiencyReport`] and forwards each
//! transition to a [`TelemetrySink`]. The default sink turns notifications
//! into `trace!` events; persistence and formatting belong to the sink.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use metaforge_core::{ConstraintKind, EntityId};
use tracing::trace;

/// Kind of a telemetry notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryKind {
    SearchStart,
    SearchEnd,
    ApplyStart,
    ApplyEnd,
    ApplyFailed,
    UnapplyStart,
    UnapplyEnd,
}

impl TelemetryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TelemetryKind::SearchStart => "search_start",
            TelemetryKind::SearchEnd => "search_end",
            TelemetryKind::ApplyStart => "apply_start",
            TelemetryKind::ApplyEnd => "apply_end",
            TelemetryKind::ApplyFailed => "apply_failed",
            TelemetryKind::UnapplyStart => "unapply_start",
            TelemetryKind::UnapplyEnd => "unapply_end",
        }
    }
}

/// One structured notification.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryEvent<'a> {
    /// Name of the component that emitted the event.
    pub component: &'a str,
    pub id: EntityId,
    pub kind: TelemetryKind,
    /// Movement involved, for apply/unapply events.
    pub movement: Option<&'a str>,
    /// Infeasible constraint kinds of the discarded evaluation, for `UnapplyEnd`.
    pub infeasible: &'a [ConstraintKind],
}

/// Receiver of telemetry notifications.
pub trait TelemetrySink: Send + Sync + Debug {
    fn notify(&self, event: &TelemetryEvent<'_>);
}

/// Forwards notifications as `trace!` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn notify(&self, event: &TelemetryEvent<'_>) {
        trace!(
            event = event.kind.as_str(),
            component = event.component,
            id = %event.id,
            movement = event.movement.unwrap_or(""),
            infeasible_constraints = event.infeasible.len(),
        );
    }
}

/// Counts notifications per kind.
///
/// Useful for testing and statistics collection.
#[derive(Debug, Default)]
pub struct CountingSink {
    counts: Mutex<HashMap<TelemetryKind, usize>>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of notifications of `kind` received so far.
    pub fn count(&self, kind: TelemetryKind) -> usize {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }
}

impl TelemetrySink for CountingSink {
    fn notify(&self, event: &TelemetryEvent<'_>) {
        *self
            .counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.kind)
            .or_insert(0) += 1;
    }
}

/// Aggregated efficiency counters of one component.
///
/// # Example
///
/// ```
/// use metaforge_solver::telemetry::EfficiencyReport;
/// use std::time::Duration;
///
/// let mut report = EfficiencyReport::default();
/// report.record_search(Duration::from_millis(2));
/// report.record_apply(true, Duration::ZERO);
/// report.record_apply(false, Duration::ZERO);
///
/// assert_eq!(report.searches, 1);
/// assert_eq!(report.applies, 1);
/// assert_eq!(report.failed_applies, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EfficiencyReport {
    /// Number of builds.
    pub searches: u64,
    /// Movements handed out.
    pub moves_yielded: u64,
    /// Successful applies.
    pub applies: u64,
    /// Applies that reported the movement as not applicable.
    pub failed_applies: u64,
    pub unapplies: u64,
    /// Movements committed to the solution.
    pub accepted: u64,
    pub build_time: Duration,
    pub apply_time: Duration,
    pub unapply_time: Duration,
    /// How often each constraint kind was infeasible on an unapplied evaluation.
    pub constraint_per_unapply: BTreeMap<ConstraintKind, u64>,
    /// Unapplies whose discarded evaluation had no infeasible constraint.
    pub unapply_no_constraint: u64,
    /// Sum of objective improvements of accepted movements.
    pub summed_improvement: f64,
}

impl EfficiencyReport {
    pub fn record_search(&mut self, elapsed: Duration) {
        self.searches += 1;
        self.build_time += elapsed;
    }

    pub fn record_move_yielded(&mut self) {
        self.moves_yielded += 1;
    }

    pub fn record_apply(&mut self, applied: bool, elapsed: Duration) {
        if applied {
            self.applies += 1;
        } else {
            self.failed_applies += 1;
        }
        self.apply_time += elapsed;
    }

    pub fn record_unapply<'a>(
        &mut self,
        infeasible: impl IntoIterator<Item = &'a ConstraintKind>,
        elapsed: Duration,
    ) {
        self.unapplies += 1;
        self.unapply_time += elapsed;
        let mut any = false;
        for kind in infeasible {
            any = true;
            *self.constraint_per_unapply.entry(kind.clone()).or_insert(0) += 1;
        }
        if !any {
            self.unapply_no_constraint += 1;
        }
    }

    pub fn record_accept(&mut self, improvement: f64) {
        self.accepted += 1;
        self.summed_improvement += improvement;
    }

    /// Accepted movements per successful apply.
    pub fn acceptance_rate(&self) -> f64 {
        if self.applies == 0 {
            0.0
        } else {
            self.accepted as f64 / self.applies as f64
        }
    }

    /// Adds the counters of `other` into `self`.
    pub fn merge(&mut self, other: &EfficiencyReport) {
        self.searches += other.searches;
        self.moves_yielded += other.moves_yielded;
        self.applies += other.applies;
        self.failed_applies += other.failed_applies;
        self.unapplies += other.unapplies;
        self.accepted += other.accepted;
        self.build_time += other.build_time;
        self.apply_time += other.apply_time;
        self.unapply_time += other.unapply_time;
        for (kind, count) in &other.constraint_per_unapply {
            *self.constraint_per_unapply.entry(kind.clone()).or_insert(0) += count;
        }
        self.unapply_no_constraint += other.unapply_no_constraint;
        self.summed_improvement += other.summed_improvement;
    }
}

impl fmt::Display for EfficiencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "searches={} moves={} applies={} failed={} unapplies={} accepted={} \
             improvement={} build_ms={} apply_ms={} unapply_ms={}",
            self.searches,
            self.moves_yielded,
            self.applies,
            self.failed_applies,
            self.unapplies,
            self.accepted,
            self.summed_improvement,
            self.build_time.as_millis(),
            self.apply_time.as_millis(),
            self.unapply_time.as_millis(),
        )?;
        if !self.constraint_per_unapply.is_empty() {
            let parts: Vec<String> = self
                .constraint_per_unapply
                .iter()
                .map(|(kind, count)| format!("{}:{}", kind, count))
                .collect();
            write!(f, " constraints=[{}]", parts.join(","))?;
        }
        write!(f, " no_constraint={}", self.unapply_no_constraint)
    }
}

/// Report plus sink, owned by a tracked component.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub(crate) report: EfficiencyReport,
    sink: Arc<dyn TelemetrySink>,
}

impl Telemetry {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            report: EfficiencyReport::default(),
            sink,
        }
    }

    pub fn report(&self) -> &EfficiencyReport {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut EfficiencyReport {
        &mut self.report
    }

    pub fn sink(&self) -> &Arc<dyn TelemetrySink> {
        &self.sink
    }

    /// Same sink, fresh counters.
    pub fn fresh(&self) -> Self {
        Self::new(Arc::clone(&self.sink))
    }

    pub fn notify(
        &self,
        component: &str,
        id: EntityId,
        kind: TelemetryKind,
        movement: Option<&str>,
        infeasible: &[ConstraintKind],
    ) {
        self.sink.notify(&TelemetryEvent {
            component,
            id,
            kind,
            movement,
            infeasible,
        });
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}
