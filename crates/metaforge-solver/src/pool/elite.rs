use metaforge_core::{EntityId, Evaluation, Evaluator, MetaforgeError, Result, Solution};

use super::{Pool, PoolStats};

/// Keeps the best `limit` distinct solutions.
///
/// Below the limit every offer is admitted. Once full, a candidate enters
/// only if it is strictly better than the current worst member and no
/// member has the same hash; the worst member is then evicted. The worst
/// member is located lazily and cached until the next replacement.
///
/// # Example
///
/// ```
/// use metaforge_solver::pool::{ElitePool, Pool};
/// use metaforge_test::{sum_evaluator, VectorSolution};
///
/// let evaluator = sum_evaluator();
/// let mut pool = ElitePool::new(2).unwrap();
///
/// assert!(pool.add(VectorSolution::new(vec![5]), &evaluator));
/// assert!(pool.add(VectorSolution::new(vec![3]), &evaluator));
/// assert!(!pool.add(VectorSolution::new(vec![7]), &evaluator));
/// assert!(pool.add(VectorSolution::new(vec![1]), &evaluator));
/// assert_eq!(pool.get_best(&evaluator).unwrap().values, vec![1]);
/// ```
#[derive(Debug, Clone)]
pub struct ElitePool<S> {
    id: EntityId,
    limit: usize,
    members: Vec<S>,
    worst: Option<(usize, Evaluation)>,
    stats: PoolStats,
}

impl<S: Solution> ElitePool<S> {
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(MetaforgeError::Configuration(
                "elite pool limit must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            id: EntityId::next(),
            limit,
            members: Vec::with_capacity(limit),
            worst: None,
            stats: PoolStats::default(),
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn worst(&mut self, evaluator: &dyn Evaluator<S>) -> Option<(usize, Evaluation)> {
        if self.worst.is_none() {
            let mut iter = self.members.iter().enumerate();
            let (_, first) = iter.next()?;
            let mut worst = (0, evaluator.evaluate(first));
            for (index, member) in iter {
                let evaluation = evaluator.evaluate(member);
                if worst.1.better_than(&evaluation) {
                    worst = (index, evaluation);
                }
            }
            self.worst = Some(worst);
        }
        self.worst.clone()
    }

    fn admit(
        &mut self,
        solution: S,
        evaluation: &Evaluation,
        evaluator: &dyn Evaluator<S>,
    ) -> bool {
        if self.members.len() < self.limit {
            self.members.push(solution);
            self.worst = None;
            return true;
        }
        let Some((worst_index, worst)) = self.worst(evaluator) else {
            return false;
        };
        if !evaluation.better_than(&worst) {
            return false;
        }
        let hash = solution.solution_hash();
        if self.members.iter().any(|member| member.solution_hash() == hash) {
            return false;
        }
        self.members.remove(worst_index);
        self.members.push(solution);
        self.worst = None;
        true
    }
}

impl<S: Solution> Pool<S> for ElitePool<S> {
    fn name(&self) -> &'static str {
        "ElitePool"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn add(&mut self, solution: S, evaluator: &dyn Evaluator<S>) -> bool {
        let evaluation = evaluator.evaluate(&solution);
        let accepted = self.admit(solution, &evaluation, evaluator);
        self.stats.record("ElitePool", self.id, accepted, &evaluation, 0.0);
        accepted
    }

    fn solutions(&self) -> &[S] {
        &self.members
    }

    fn clear(&mut self) {
        self.members.clear();
        self.worst = None;
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
