//! Wall-clock and iteration-count stop criteria.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use metaforge_core::{MetaforgeError, Result};
use tracing::info;

use super::StopCriteria;

/// Stops once the elapsed time exceeds a bound or the counter exceeds a maximum.
///
/// Both bounds are optional; with neither set the criteria never fires.
///
/// # Example
///
/// ```
/// use metaforge_solver::stop::{StopCriteria, StopTimeIteration};
///
/// let stop = StopTimeIteration::iterations(2);
/// stop.increment_counter();
/// stop.increment_counter();
/// assert!(!stop.stop());
///
/// stop.increment_counter();
/// assert!(stop.stop());
/// ```
pub struct StopTimeIteration {
    time_limit: Option<Duration>,
    max_iterations: Option<u64>,
    progress_step: Option<f64>,
    started: Mutex<Instant>,
    counter: AtomicU64,
    reported_steps: AtomicU64,
}

impl StopTimeIteration {
    pub fn new(time_limit: Option<Duration>, max_iterations: Option<u64>) -> Self {
        Self {
            time_limit,
            max_iterations,
            progress_step: None,
            started: Mutex::new(Instant::now()),
            counter: AtomicU64::new(0),
            reported_steps: AtomicU64::new(0),
        }
    }

    /// Stops strictly after `max` iterations.
    pub fn iterations(max: u64) -> Self {
        Self::new(None, Some(max))
    }

    /// Stops once `limit` has elapsed.
    pub fn time(limit: Duration) -> Self {
        Self::new(Some(limit), None)
    }

    /// Never stops on its own.
    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// Logs progress each time it crosses a multiple of `step` (a fraction in `(0, 1]`).
    pub fn with_progress_step(mut self, step: f64) -> Result<Self> {
        if !(step > 0.0 && step <= 1.0) {
            return Err(MetaforgeError::Configuration(format!(
                "progress step must be in (0, 1], got {}",
                step
            )));
        }
        self.progress_step = Some(step);
        Ok(self)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn max_iterations(&self) -> Option<u64> {
        self.max_iterations
    }

    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Fresh copy with the same bounds and progress step.
    pub(super) fn fresh(&self) -> StopTimeIteration {
        StopTimeIteration {
            progress_step: self.progress_step,
            ..StopTimeIteration::new(self.time_limit, self.max_iterations)
        }
    }

    fn report_progress(&self) {
        let Some(step) = self.progress_step else {
            return;
        };
        let steps = (self.progress() / step).floor() as u64;
        if steps > self.reported_steps.swap(steps, Ordering::Relaxed) {
            info!(
                event = "progress",
                percent = self.progress() * 100.0,
                iterations = self.counter(),
                elapsed_ms = self.elapsed().as_millis() as u64,
            );
        }
    }
}

impl StopCriteria for StopTimeIteration {
    fn stop(&self) -> bool {
        self.time_limit.is_some_and(|limit| self.elapsed() > limit)
            || self.max_iterations.is_some_and(|max| self.counter() > max)
    }

    fn increment_counter(&self) {
        self.counter.fetch_add(1, Ordering::Relaxed);
        self.report_progress();
    }

    fn reset(&self) {
        self.counter.store(0, Ordering::Relaxed);
        self.reported_steps.store(0, Ordering::Relaxed);
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn progress(&self) -> f64 {
        let by_iterations = self
            .max_iterations
            .map(|max| if max == 0 { 1.0 } else { self.counter() as f64 / max as f64 });
        let by_time = self.time_limit.map(|limit| {
            if limit.is_zero() {
                1.0
            } else {
                self.elapsed().as_secs_f64() / limit.as_secs_f64()
            }
        });
        by_iterations
            .into_iter()
            .chain(by_time)
            .fold(0.0f64, f64::max)
            .min(1.0)
    }

    fn current_status(&self) -> String {
        let elapsed = self.elapsed().as_millis();
        let mut status = format!("elapsed: {}ms;", elapsed);
        if let Some(limit) = self.time_limit {
            let limit_ms = limit.as_millis().max(1);
            status.push_str(&format!(
                " time: {:.2}%;",
                elapsed as f64 / limit_ms as f64 * 100.0
            ));
        }
        if let Some(max) = self.max_iterations {
            status.push_str(&format!(
                " iteration: {} - {:.2}%;",
                self.counter(),
                self.counter() as f64 / max.max(1) as f64 * 100.0
            ));
        }
        status
    }

    fn box_clone(&self) -> Box<dyn StopCriteria> {
        Box::new(self.fresh())
    }
}

impl Debug for StopTimeIteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopTimeIteration")
            .field("time_limit", &self.time_limit)
            .field("max_iterations", &self.max_iterations)
            .field("counter", &self.counter())
            .finish()
    }
}
