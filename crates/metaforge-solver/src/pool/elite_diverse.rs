use std::fmt::{self, Debug};
use std::sync::Arc;

use metaforge_core::{EntityId, Evaluator, MetaforgeError, Result, Solution};

use super::{Pool, PoolStats};

/// Hook applied to a newly admitted solution that improves the best objective.
pub type AddAction<S> = Arc<dyn Fn(&mut S) + Send + Sync>;

/// Objectives closer than this to the best are protected from eviction.
const BEST_PROTECTION: f64 = 1e-4;

/// Bounded pool whose eviction score blends quality and novelty.
///
/// A member's score is its relative objective gap to the best known
/// objective minus `diversity_weight` times its average dissimilarity to
/// the other members; higher is worse. Once full, a candidate replaces the
/// member with the highest score if its own score is lower.
///
/// A candidate with the hash of an existing member is always rejected. A
/// candidate that improves the best known objective is always admitted.
pub struct EliteDiversePool<S> {
    id: EntityId,
    limit: usize,
    diversity_weight: f64,
    members: Vec<S>,
    scores: Vec<f64>,
    worst_index: usize,
    best_objective: f64,
    action_on_add: Option<AddAction<S>>,
    stats: PoolStats,
}

impl<S: Solution> EliteDiversePool<S> {
    pub fn new(limit: usize, diversity_weight: f64) -> Result<Self> {
        if limit == 0 {
            return Err(MetaforgeError::Configuration(
                "elite diverse pool limit must be at least 1".to_string(),
            ));
        }
        if !diversity_weight.is_finite() || diversity_weight < 0.0 {
            return Err(MetaforgeError::Configuration(format!(
                "diversity weight must be finite and non-negative, got {}",
                diversity_weight
            )));
        }
        Ok(Self {
            id: EntityId::next(),
            limit,
            diversity_weight,
            members: Vec::with_capacity(limit),
            scores: Vec::new(),
            worst_index: 0,
            best_objective: f64::INFINITY,
            action_on_add: None,
            stats: PoolStats::default(),
        })
    }

    /// Runs `action` on every admitted solution that improves the best
    /// objective, then re-evaluates it.
    pub fn with_action_on_add(mut self, action: AddAction<S>) -> Self {
        self.action_on_add = Some(action);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn diversity_weight(&self) -> f64 {
        self.diversity_weight
    }

    /// Best objective seen among admitted solutions.
    pub fn best_objective(&self) -> f64 {
        self.best_objective
    }

    fn is_full(&self) -> bool {
        self.members.len() >= self.limit
    }

    fn relative_gap(&self, objective: f64) -> f64 {
        if !self.best_objective.is_finite() {
            return 0.0;
        }
        let gap = objective - self.best_objective;
        if self.best_objective.abs() < f64::EPSILON {
            gap
        } else {
            gap / self.best_objective.abs()
        }
    }

    /// Average dissimilarity of `solution` against the members selected by `include`.
    fn average_diversity(&self, solution: &S, include: impl Fn(usize) -> bool) -> f64 {
        let (sum, count) = self
            .members
            .iter()
            .enumerate()
            .filter(|(index, _)| include(*index))
            .fold((0.0, 0usize), |(sum, count), (_, member)| {
                (sum + solution.dissimilarity(member), count + 1)
            });
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Score a candidate would get; `-inf` for a new best, `+inf` for a duplicate.
    fn candidate_score(&self, solution: &S, objective: f64) -> f64 {
        let hash = solution.solution_hash();
        if self.members.iter().any(|member| member.solution_hash() == hash) {
            return f64::INFINITY;
        }
        if objective < self.best_objective {
            return f64::NEG_INFINITY;
        }
        let full = self.is_full();
        let worst = self.worst_index;
        let diversity = self.average_diversity(solution, |index| !full || index != worst);
        self.relative_gap(objective) - diversity * self.diversity_weight
    }

    fn update_scores(&mut self, evaluator: &dyn Evaluator<S>) {
        let mut scores = Vec::with_capacity(self.members.len());
        let mut worst: Option<(usize, f64)> = None;
        let mut fallback: Option<(usize, f64)> = None;
        for (index, member) in self.members.iter().enumerate() {
            let objective = evaluator.evaluate(member).objective();
            let diversity = self.average_diversity(member, |other| other != index);
            let score = self.relative_gap(objective) - diversity * self.diversity_weight;
            scores.push(score);

            if fallback.map_or(true, |(_, s)| score > s) {
                fallback = Some((index, score));
            }
            let protected = (self.best_objective - objective).abs() <= BEST_PROTECTION;
            if !protected && worst.map_or(true, |(_, s)| score > s) {
                worst = Some((index, score));
            }
        }
        self.scores = scores;
        self.worst_index = worst.or(fallback).map_or(0, |(index, _)| index);
    }

    fn after_admission(&mut self, evaluator: &dyn Evaluator<S>) {
        let last = self.members.len() - 1;
        let mut objective = evaluator.evaluate(&self.members[last]).objective();
        if objective < self.best_objective {
            if let Some(action) = &self.action_on_add {
                action(&mut self.members[last]);
                objective = evaluator.evaluate(&self.members[last]).objective();
            }
            self.best_objective = objective;
        }
        if self.is_full() {
            self.update_scores(evaluator);
        }
    }
}

impl<S: Solution> Pool<S> for EliteDiversePool<S> {
    fn name(&self) -> &'static str {
        "EliteDiversePool"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn add(&mut self, solution: S, evaluator: &dyn Evaluator<S>) -> bool {
        let evaluation = evaluator.evaluate(&solution);
        let score = self.candidate_score(&solution, evaluation.objective());
        let diversity = self.average_diversity(&solution, |_| true);

        let accepted = if score == f64::INFINITY {
            false
        } else if !self.is_full() {
            self.members.push(solution);
            true
        } else if score < self.scores.get(self.worst_index).copied().unwrap_or(f64::INFINITY) {
            self.members.remove(self.worst_index);
            self.members.push(solution);
            true
        } else {
            false
        };
        if accepted {
            self.after_admission(evaluator);
        }
        self.stats
            .record("EliteDiversePool", self.id, accepted, &evaluation, diversity);
        accepted
    }

    fn solutions(&self) -> &[S] {
        &self.members
    }

    fn clear(&mut self) {
        self.members.clear();
        self.scores.clear();
        self.worst_index = 0;
        self.best_objective = f64::INFINITY;
    }

    fn stats(&self) -> PoolStats {
        self.stats
    }

    fn box_clone(&self) -> Box<dyn Pool<S>> {
        Box::new(Self {
            id: EntityId::next(),
            limit: self.limit,
            diversity_weight: self.diversity_weight,
            members: self.members.clone(),
            scores: self.scores.clone(),
            worst_index: self.worst_index,
            best_objective: self.best_objective,
            action_on_add: self.action_on_add.clone(),
            stats: self.stats,
        })
    }
}

impl<S> Debug for EliteDiversePool<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EliteDiversePool")
            .field("id", &self.id)
            .field("limit", &self.limit)
            .field("diversity_weight", &self.diversity_weight)
            .field("members", &self.members.len())
            .field("best_objective", &self.best_objective)
            .field("worst_index", &self.worst_index)
            .finish()
    }
}
