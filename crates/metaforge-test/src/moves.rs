//! Movement and neighborhood fixtures.

use std::sync::{Arc, Mutex};

use metaforge_core::{BoxedMovement, MetaforgeError, Movement, Neighborhood, Result, ThreadRandom};

use crate::vector::VectorSolution;

/// One recorded movement transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEntry {
    Applied(i64),
    Unapplied(i64),
}

/// Shared record of movement transitions, in call order.
pub type MoveLog = Arc<Mutex<Vec<LogEntry>>>;

/// Adds `delta` to one position; its cost is `delta`.
#[derive(Debug, Clone)]
pub struct ShiftMove {
    pub index: usize,
    pub delta: i64,
    log: Option<MoveLog>,
}

impl ShiftMove {
    pub fn new(index: usize, delta: i64) -> Self {
        Self {
            index,
            delta,
            log: None,
        }
    }

    pub fn with_log(mut self, log: MoveLog) -> Self {
        self.log = Some(log);
        self
    }

    fn record(&self, entry: LogEntry) {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(entry);
        }
    }
}

impl Movement<VectorSolution> for ShiftMove {
    fn name(&self) -> &'static str {
        "ShiftMove"
    }

    fn cost(&self) -> f64 {
        self.delta as f64
    }

    fn apply(&mut self, solution: &mut VectorSolution) -> Result<bool> {
        match solution.values.get_mut(self.index) {
            Some(value) => {
                *value += self.delta;
                self.record(LogEntry::Applied(self.delta));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn unapply(&mut self, solution: &mut VectorSolution) -> Result<()> {
        let value = solution
            .values
            .get_mut(self.index)
            .ok_or_else(|| MetaforgeError::movement("ShiftMove", "index out of range"))?;
        *value -= self.delta;
        self.record(LogEntry::Unapplied(self.delta));
        Ok(())
    }
}

/// Yields a fixed list of shifts on one index, in order.
///
/// With a build limit, `build` returns false once it has been called that
/// many times.
#[derive(Debug, Clone)]
pub struct ScriptedNeighborhood {
    index: usize,
    deltas: Vec<i64>,
    cursor: usize,
    builds: usize,
    build_limit: Option<usize>,
    log: MoveLog,
}

impl ScriptedNeighborhood {
    pub fn new(index: usize, deltas: Vec<i64>) -> Self {
        Self {
            index,
            deltas,
            cursor: 0,
            builds: 0,
            build_limit: None,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_build_limit(mut self, limit: usize) -> Self {
        self.build_limit = Some(limit);
        self
    }

    /// Shared transition log of every movement handed out.
    pub fn log(&self) -> MoveLog {
        Arc::clone(&self.log)
    }
}

impl Neighborhood<VectorSolution> for ScriptedNeighborhood {
    fn name(&self) -> &'static str {
        "ScriptedNeighborhood"
    }

    fn build(&mut self, _random: &ThreadRandom<'_>, _solution: &VectorSolution) -> Result<bool> {
        if self.build_limit.is_some_and(|limit| self.builds >= limit) {
            return Ok(false);
        }
        self.builds += 1;
        self.cursor = 0;
        Ok(!self.deltas.is_empty())
    }

    fn next_move(
        &mut self,
        _random: &ThreadRandom<'_>,
    ) -> Result<Option<BoxedMovement<VectorSolution>>> {
        let Some(delta) = self.deltas.get(self.cursor).copied() else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some(Box::new(
            ShiftMove::new(self.index, delta).with_log(Arc::clone(&self.log)),
        )))
    }

    fn box_clone(&self) -> Box<dyn Neighborhood<VectorSolution>> {
        Box::new(self.clone())
    }
}

/// Yields `-1` and `+1` shifts for every position.
#[derive(Debug, Clone, Default)]
pub struct ShiftNeighborhood {
    len: usize,
    cursor: usize,
}

impl ShiftNeighborhood {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Neighborhood<VectorSolution> for ShiftNeighborhood {
    fn name(&self) -> &'static str {
        "ShiftNeighborhood"
    }

    fn build(&mut self, _random: &ThreadRandom<'_>, solution: &VectorSolution) -> Result<bool> {
        self.len = solution.values.len();
        self.cursor = 0;
        Ok(self.len > 0)
    }

    fn next_move(
        &mut self,
        _random: &ThreadRandom<'_>,
    ) -> Result<Option<BoxedMovement<VectorSolution>>> {
        if self.cursor >= self.len * 2 {
            return Ok(None);
        }
        let index = self.cursor / 2;
        let delta = if self.cursor % 2 == 0 { -1 } else { 1 };
        self.cursor += 1;
        Ok(Some(Box::new(ShiftMove::new(index, delta))))
    }

    fn reset(&mut self, solution: &VectorSolution) {
        self.len = solution.values.len();
        self.cursor = 0;
    }

    fn box_clone(&self) -> Box<dyn Neighborhood<VectorSolution>> {
        Box::new(self.clone())
    }
}

/// Yields a fixed number of random shifts of magnitude up to `magnitude`.
#[derive(Debug, Clone)]
pub struct RandomKickNeighborhood {
    magnitude: i64,
    moves_per_build: usize,
    pending: Vec<(usize, i64)>,
}

impl RandomKickNeighborhood {
    pub fn new(magnitude: i64) -> Self {
        Self {
            magnitude: magnitude.max(1),
            moves_per_build: 1,
            pending: Vec::new(),
        }
    }

    pub fn with_moves_per_build(mut self, count: usize) -> Self {
        self.moves_per_build = count.max(1);
        self
    }
}

impl Neighborhood<VectorSolution> for RandomKickNeighborhood {
    fn name(&self) -> &'static str {
        "RandomKickNeighborhood"
    }

    fn build(&mut self, random: &ThreadRandom<'_>, solution: &VectorSolution) -> Result<bool> {
        self.pending.clear();
        if solution.values.is_empty() {
            return Ok(false);
        }
        let span = (self.magnitude * 2) as usize;
        for _ in 0..self.moves_per_build {
            let index = random.next_in_range(0..solution.values.len());
            let offset = random.next_in_range(0..span) as i64;
            let delta = if offset < self.magnitude {
                offset - self.magnitude
            } else {
                offset - self.magnitude + 1
            };
            self.pending.push((index, delta));
        }
        self.pending.reverse();
        Ok(true)
    }

    fn next_move(
        &mut self,
        _random: &ThreadRandom<'_>,
    ) -> Result<Option<BoxedMovement<VectorSolution>>> {
        Ok(self
            .pending
            .pop()
            .map(|(index, delta)| Box::new(ShiftMove::new(index, delta)) as BoxedMovement<_>))
    }

    fn box_clone(&self) -> Box<dyn Neighborhood<VectorSolution>> {
        Box::new(self.clone())
    }
}

/// Builds successfully, then reports a defect instead of a movement.
#[derive(Debug, Clone, Default)]
pub struct FailingNeighborhood;

impl Neighborhood<VectorSolution> for FailingNeighborhood {
    fn name(&self) -> &'static str {
        "FailingNeighborhood"
    }

    fn build(&mut self, _random: &ThreadRandom<'_>, _solution: &VectorSolution) -> Result<bool> {
        Ok(true)
    }

    fn next_move(
        &mut self,
        _random: &ThreadRandom<'_>,
    ) -> Result<Option<BoxedMovement<VectorSolution>>> {
        Err(MetaforgeError::movement("FailingNeighborhood", "cannot produce moves"))
    }

    fn box_clone(&self) -> Box<dyn Neighborhood<VectorSolution>> {
        Box::new(self.clone())
    }
}
