//! Neighborhood selection strategies.
//!
//! A selection holds an explicit cursor over an order of its neighborhoods.
//! The order is recomputed on every [`NeighborhoodSelection::reset`]; a
//! circular selection also recomputes it when the cursor wraps around.

use std::cmp::Ordering;
use std::fmt::{self, Debug};

use metaforge_core::{EntityId, MetaforgeError, Neighborhood, Result, ThreadRandom};

use super::tracked::TrackedNeighborhood;
use crate::telemetry::EfficiencyReport;

/// Order in which a [`NeighborhoodSelection`] visits its neighborhoods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionStrategy {
    /// Insertion order.
    #[default]
    List,

    /// Shuffled with the calling thread's stream at each reset.
    Random,

    /// Weighted random permutation: one uniform draw per neighborhood,
    /// scaled by its weight, sorted descending.
    Probability,
}

struct Entry<S> {
    neighborhood: TrackedNeighborhood<S>,
    weight: f64,
}

/// Chooses which neighborhood a search consults next.
///
/// Selections are never shared across threads; [`Clone`] makes a deep,
/// independent copy of every neighborhood.
///
/// # Example
///
/// ```
/// use metaforge_core::ThreadManager;
/// use metaforge_solver::heuristic::NeighborhoodSelection;
/// use metaforge_test::ShiftNeighborhood;
///
/// let threads = ThreadManager::single(Some(1));
/// let random = threads.random(0);
///
/// let mut selection = NeighborhoodSelection::list(false)
///     .with(ShiftNeighborhood::new())
///     .with(ShiftNeighborhood::new());
///
/// selection.reset(&random);
/// assert!(selection.next(&random).is_ok());
/// assert!(selection.next(&random).is_ok());
/// assert!(selection.next(&random).unwrap_err().is_exhausted());
/// ```
pub struct NeighborhoodSelection<S> {
    strategy: SelectionStrategy,
    circular: bool,
    entries: Vec<Entry<S>>,
    order: Vec<usize>,
    cursor: usize,
    prepared: bool,
}

impl<S: 'static> NeighborhoodSelection<S> {
    pub fn new(strategy: SelectionStrategy, circular: bool) -> Self {
        Self {
            strategy,
            circular,
            entries: Vec::new(),
            order: Vec::new(),
            cursor: 0,
            prepared: false,
        }
    }

    pub fn list(circular: bool) -> Self {
        Self::new(SelectionStrategy::List, circular)
    }

    pub fn random(circular: bool) -> Self {
        Self::new(SelectionStrategy::Random, circular)
    }

    pub fn probability(circular: bool) -> Self {
        Self::new(SelectionStrategy::Probability, circular)
    }

    /// Adds a neighborhood with weight 1.
    pub fn with(mut self, neighborhood: impl Neighborhood<S> + 'static) -> Self {
        self.entries.push(Entry {
            neighborhood: TrackedNeighborhood::new(neighborhood),
            weight: 1.0,
        });
        self.prepared = false;
        self
    }

    /// Adds a neighborhood with a selection weight.
    ///
    /// Weights only matter for [`SelectionStrategy::Probability`] and must
    /// be finite and non-negative.
    pub fn with_weighted(
        mut self,
        neighborhood: impl Neighborhood<S> + 'static,
        weight: f64,
    ) -> Result<Self> {
        self.push(TrackedNeighborhood::new(neighborhood), weight)?;
        Ok(self)
    }

    pub fn push(&mut self, neighborhood: TrackedNeighborhood<S>, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(MetaforgeError::Configuration(format!(
                "selection weight must be finite and non-negative, got {}",
                weight
            )));
        }
        self.entries.push(Entry {
            neighborhood,
            weight,
        });
        self.prepared = false;
        Ok(())
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    pub fn is_circular(&self) -> bool {
        self.circular
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the cursor within the current order.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Recomputes the order and rewinds the cursor.
    pub fn reset(&mut self, random: &ThreadRandom<'_>) {
        self.order = (0..self.entries.len()).collect();
        match self.strategy {
            SelectionStrategy::List => {}
            SelectionStrategy::Random => random.shuffle(&mut self.order),
            SelectionStrategy::Probability => {
                let keys: Vec<f64> = self
                    .entries
                    .iter()
                    .map(|entry| random.next_f64() * entry.weight)
                    .collect();
                self.order.sort_by(|&a, &b| {
                    keys[b].partial_cmp(&keys[a]).unwrap_or(Ordering::Equal)
                });
            }
        }
        self.cursor = 0;
        self.prepared = true;
    }

    /// Index of the next neighborhood in insertion order.
    ///
    /// A non-circular selection fails with `Exhausted` once every
    /// neighborhood was handed out; so does an empty one.
    pub fn next_index(&mut self, random: &ThreadRandom<'_>) -> Result<usize> {
        if self.entries.is_empty() {
            return Err(MetaforgeError::exhausted("empty neighborhood selection"));
        }
        if !self.prepared {
            self.reset(random);
        }
        if self.cursor >= self.order.len() {
            if !self.circular {
                return Err(MetaforgeError::exhausted("neighborhood selection"));
            }
            self.reset(random);
        }
        let index = self.order[self.cursor];
        self.cursor += 1;
        Ok(index)
    }

    /// Next neighborhood to consult.
    pub fn next(&mut self, random: &ThreadRandom<'_>) -> Result<&mut TrackedNeighborhood<S>> {
        let index = self.next_index(random)?;
        Ok(&mut self.entries[index].neighborhood)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut TrackedNeighborhood<S>> {
        self.entries.get_mut(index).map(|entry| &mut entry.neighborhood)
    }

    /// Drops a neighborhood that can never apply again.
    ///
    /// The remaining order and the cursor position are preserved.
    pub fn remove(&mut self, id: EntityId) -> Option<TrackedNeighborhood<S>> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.neighborhood.id() == id)?;
        let removed = self.entries.remove(index);
        if let Some(position) = self.order.iter().position(|&i| i == index) {
            self.order.remove(position);
            if position < self.cursor {
                self.cursor -= 1;
            }
        }
        for slot in &mut self.order {
            if *slot > index {
                *slot -= 1;
            }
        }
        Some(removed.neighborhood)
    }

    /// Invalidates cached candidates of every neighborhood.
    pub fn reset_neighborhoods(&mut self, solution: &S) {
        for entry in &mut self.entries {
            entry.neighborhood.reset(solution);
        }
    }

    pub fn neighborhoods(&self) -> impl Iterator<Item = &TrackedNeighborhood<S>> {
        self.entries.iter().map(|entry| &entry.neighborhood)
    }

    /// Efficiency report of every neighborhood, by name.
    pub fn reports(&self) -> Vec<(&'static str, EfficiencyReport)> {
        self.entries
            .iter()
            .map(|entry| (entry.neighborhood.name(), entry.neighborhood.report().clone()))
            .collect()
    }
}

impl<S: 'static> Clone for NeighborhoodSelection<S> {
    fn clone(&self) -> Self {
        Self {
            strategy: self.strategy,
            circular: self.circular,
            entries: self
                .entries
                .iter()
                .map(|entry| Entry {
                    neighborhood: entry.neighborhood.clone(),
                    weight: entry.weight,
                })
                .collect(),
            order: Vec::new(),
            cursor: 0,
            prepared: false,
        }
    }
}

impl<S> Debug for NeighborhoodSelection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeighborhoodSelection")
            .field("strategy", &self.strategy)
            .field("circular", &self.circular)
            .field("neighborhoods", &self.entries.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
