use metaforge_core::{EntityId, Evaluator, Solution};

use super::{Pool, PoolStats};

/// Unbounded pool that admits every solution.
#[derive(Debug, Clone)]
pub struct ListPool<S> {
    id: EntityId,
    members: Vec<S>,
    stats: PoolStats,
}

impl<S> ListPool<S> {
    pub fn new() -> Self {
        Self {
            id: EntityId::next(),
            members: Vec::new(),
            stats: PoolStats::default(),
        }
    }
}

impl<S> Default for ListPool<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Solution> Pool<S> for ListPool<S> {
    fn name(&self) -> &'static str {
        "ListPool"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn add(&mut self, solution: S, evaluator: &dyn Evaluator<S>) -> bool {
        let evaluation = evaluator.evaluate(&solution);
        self.members.push(solution);
        self.stats.record("ListPool", self.id, true, &evaluation, 0.0);
        true
    }

    fn solutions(&self) -> &[S] {
        &self.members
    }

    fn clear(&mut self) {
        self.members.clear();
    }

    fn stats(&self) -> PoolStats {
        self.stats
    }

    fn box_clone(&self) -> Box<dyn Pool<S>> {
        Box::new(Self {
            id: EntityId::next(),
            ..self.clone()
        })
    }
}
