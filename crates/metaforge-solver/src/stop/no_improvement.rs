//! Plateau detection over a sliding window of objective values.

use std::collections::VecDeque;
use std::fmt::{self, Debug};
use std::sync::{Mutex, PoisonError};

use metaforge_core::{Evaluation, MetaforgeError, Result};

use super::{StopCriteria, StopTimeIteration};

/// Stops when the objective has plateaued, or when the inner time/iteration bounds fire.
///
/// `stop_on_evaluations` records the first evaluation it is given;
/// `increment_counter` pushes that value into a window of the last
/// `iterations_no_improv` objectives. Once the window is full and the
/// relative change between its oldest and newest value is within
/// `tolerance`, the criteria fires.
pub struct StopNoImprovement {
    inner: StopTimeIteration,
    iterations_no_improv: usize,
    tolerance: f64,
    state: Mutex<Plateau>,
}

#[derive(Debug, Default)]
struct Plateau {
    window: VecDeque<f64>,
    last: Option<f64>,
}

impl StopNoImprovement {
    pub fn new(
        inner: StopTimeIteration,
        iterations_no_improv: usize,
        tolerance: f64,
    ) -> Result<Self> {
        if iterations_no_improv == 0 {
            return Err(MetaforgeError::Configuration(
                "iterations_no_improv must be at least 1".to_string(),
            ));
        }
        if !(tolerance >= 0.0 && tolerance.is_finite()) {
            return Err(MetaforgeError::Configuration(format!(
                "tolerance must be a finite non-negative number, got {}",
                tolerance
            )));
        }
        Ok(Self {
            inner,
            iterations_no_improv,
            tolerance,
            state: Mutex::new(Plateau::default()),
        })
    }

    /// Plateau detection with the smallest representable tolerance.
    pub fn with_window(inner: StopTimeIteration, iterations_no_improv: usize) -> Result<Self> {
        Self::new(inner, iterations_no_improv, f64::EPSILON)
    }

    pub fn iterations_no_improv(&self) -> usize {
        self.iterations_no_improv
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn plateau(&self) -> std::sync::MutexGuard<'_, Plateau> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Relative change from `newest` to `oldest`; absolute when `newest` is zero.
fn relative_change(oldest: f64, newest: f64) -> f64 {
    if newest == 0.0 {
        (oldest - newest).abs()
    } else {
        (oldest / newest - 1.0).abs()
    }
}

impl StopCriteria for StopNoImprovement {
    fn stop(&self) -> bool {
        self.inner.stop()
    }

    fn stop_on_evaluations(&self, evaluations: &[Evaluation]) -> bool {
        let plateaued = {
            let mut state = self.plateau();
            if let Some(first) = evaluations.first() {
                state.last = Some(first.objective());
            }
            match (state.window.front(), state.window.back()) {
                (Some(oldest), Some(newest)) if state.window.len() >= self.iterations_no_improv => {
                    relative_change(*oldest, *newest) <= self.tolerance
                }
                _ => false,
            }
        };
        plateaued || self.stop()
    }

    fn increment_counter(&self) {
        {
            let mut state = self.plateau();
            if let Some(last) = state.last {
                state.window.push_back(last);
                if state.window.len() > self.iterations_no_improv {
                    state.window.pop_front();
                }
            }
        }
        self.inner.increment_counter();
    }

    fn reset(&self) {
        *self.plateau() = Plateau::default();
        self.inner.reset();
    }

    fn progress(&self) -> f64 {
        self.inner.progress()
    }

    fn current_status(&self) -> String {
        let mut status = self.inner.current_status();
        let state = self.plateau();
        if let (Some(oldest), Some(newest), true) =
            (state.window.front(), state.window.back(), state.window.len() > 1)
        {
            status.push_str(&format!(" improvement: {};", oldest / newest - 1.0));
        }
        status
    }

    fn box_clone(&self) -> Box<dyn StopCriteria> {
        Box::new(StopNoImprovement {
            inner: self.inner.fresh(),
            iterations_no_improv: self.iterations_no_improv,
            tolerance: self.tolerance,
            state: Mutex::new(Plateau::default()),
        })
    }
}

impl Debug for StopNoImprovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopNoImprovement")
            .field("inner", &self.inner)
            .field("iterations_no_improv", &self.iterations_no_improv)
            .field("tolerance", &self.tolerance)
            .field("window", &self.plateau().window.len())
            .finish()
    }
}
