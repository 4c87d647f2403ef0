//! Run reports of metaheuristics.

use std::fmt;
use std::time::Duration;

use metaforge_core::{EntityId, Evaluation};

use crate::telemetry::EfficiencyReport;

/// One point of a recorded trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    /// Status line of the stop criteria when the point was recorded.
    pub status: String,
    pub objective: f64,
}

/// Timing and, when enabled, the best/current trajectory of a metaheuristic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionReport {
    pub runs: u64,
    pub last_duration: Duration,
    pub total_duration: Duration,
    pub best: Vec<TrajectoryPoint>,
    pub current: Vec<TrajectoryPoint>,
    logging: bool,
}

impl SolutionReport {
    pub fn new(logging: bool) -> Self {
        Self {
            logging,
            ..Self::default()
        }
    }

    pub fn is_logging(&self) -> bool {
        self.logging
    }

    pub fn set_logging(&mut self, logging: bool) {
        self.logging = logging;
    }

    pub(crate) fn record_run(&mut self, elapsed: Duration) {
        self.runs += 1;
        self.last_duration = elapsed;
        self.total_duration += elapsed;
    }

    pub(crate) fn log_best(&mut self, status: impl FnOnce() -> String, evaluation: &Evaluation) {
        if self.logging {
            self.best.push(TrajectoryPoint {
                status: status(),
                objective: evaluation.objective(),
            });
        }
    }

    pub(crate) fn log_current(&mut self, status: impl FnOnce() -> String, evaluation: &Evaluation) {
        if self.logging {
            self.current.push(TrajectoryPoint {
                status: status(),
                objective: evaluation.objective(),
            });
        }
    }

    /// Same logging setting, nothing recorded.
    pub(crate) fn fresh(&self) -> Self {
        Self::new(self.logging)
    }
}

/// Efficiency tree of a metaheuristic and everything it composes.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub name: &'static str,
    pub id: EntityId,
    pub duration: Duration,
    pub neighborhoods: Vec<(&'static str, EfficiencyReport)>,
    pub children: Vec<SearchReport>,
}

impl SearchReport {
    /// Sum of the efficiency counters of this node and all descendants.
    pub fn totals(&self) -> EfficiencyReport {
        let mut total = EfficiencyReport::default();
        for (_, report) in &self.neighborhoods {
            total.merge(report);
        }
        for child in &self.children {
            total.merge(&child.totals());
        }
        total
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        writeln!(
            f,
            "{}{} {} ({} ms)",
            indent,
            self.name,
            self.id,
            self.duration.as_millis()
        )?;
        for (name, report) in &self.neighborhoods {
            writeln!(f, "{}  - {}: {}", indent, name, report)?;
        }
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
