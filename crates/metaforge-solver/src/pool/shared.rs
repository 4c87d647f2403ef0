use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use metaforge_core::{Evaluator, Solution, ThreadRandom};

use super::{Pool, PoolStats};

/// A pool shared by several workers.
///
/// Every call takes the internal lock for its duration only; members are
/// handed out as clones. `Clone` shares the underlying pool, use
/// [`SharedPool::deep_copy`] for an independent one.
pub struct SharedPool<S: Solution> {
    inner: Arc<Mutex<Box<dyn Pool<S>>>>,
}

impl<S: Solution> SharedPool<S> {
    pub fn new(pool: Box<dyn Pool<S>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Pool<S>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, solution: S, evaluator: &dyn Evaluator<S>) -> bool {
        self.lock().add(solution, evaluator)
    }

    pub fn best(&self, evaluator: &dyn Evaluator<S>) -> Option<S> {
        self.lock().get_best(evaluator).cloned()
    }

    pub fn member(&self, index: usize) -> Option<S> {
        self.lock().get(index).cloned()
    }

    /// Uniformly drawn member, using `random`'s stream.
    pub fn random_member(&self, random: &ThreadRandom<'_>) -> Option<S> {
        let pool = self.lock();
        if pool.is_empty() {
            return None;
        }
        let index = random.next_in_range(0..pool.len());
        pool.get(index).cloned()
    }

    pub fn snapshot(&self) -> Vec<S> {
        self.lock().solutions().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> PoolStats {
        self.lock().stats()
    }

    /// Independent pool with copies of the current members.
    pub fn deep_copy(&self) -> Self {
        Self::new(self.lock().box_clone())
    }
}

impl<S: Solution> Clone for SharedPool<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Solution> Debug for SharedPool<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedPool").field(&*self.lock()).finish()
    }
}
