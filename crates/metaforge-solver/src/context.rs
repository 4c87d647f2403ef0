//! Search context passed down through nested metaheuristic runs.
//!
//! A [`SearchContext`] names the logical thread a search runs on and carries
//! the chain of enclosing stop criteria. A child search stops when its own
//! criteria fire or when any ancestor's do, without the child holding a
//! reference back to its parent algorithm.

use std::fmt::{self, Debug};

use metaforge_core::{Evaluation, ThreadManager, ThreadRandom};

use crate::stop::StopCriteria;

/// Thread identity plus the chain of stop checks of the enclosing searches.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    threads: &'a ThreadManager,
    thread_id: usize,
    stop: Option<&'a dyn StopCriteria>,
    parent: Option<&'a SearchContext<'a>>,
}

impl<'a> SearchContext<'a> {
    /// Outermost context on thread 0 with no stop criteria.
    pub fn root(threads: &'a ThreadManager) -> Self {
        Self {
            threads,
            thread_id: 0,
            stop: None,
            parent: None,
        }
    }

    /// Same chain, running on another logical thread.
    pub fn on_thread(&self, thread_id: usize) -> SearchContext<'a> {
        SearchContext {
            thread_id,
            ..*self
        }
    }

    /// Nested context whose own stop check is `stop`.
    pub fn child<'b>(&'b self, stop: &'b dyn StopCriteria) -> SearchContext<'b> {
        SearchContext {
            threads: self.threads,
            thread_id: self.thread_id,
            stop: Some(stop),
            parent: Some(self),
        }
    }

    pub fn thread_id(&self) -> usize {
        self.thread_id
    }

    pub fn threads(&self) -> &'a ThreadManager {
        self.threads
    }

    /// Random stream of this context's thread.
    pub fn random(&self) -> ThreadRandom<'a> {
        self.threads.random(self.thread_id)
    }

    /// True if the own stop criteria or any ancestor's fire.
    pub fn should_stop(&self) -> bool {
        self.stop.is_some_and(|stop| stop.stop()) || self.parent.is_some_and(|p| p.should_stop())
    }

    /// Like [`SearchContext::should_stop`], feeding `evaluations` to the own criteria.
    ///
    /// Ancestors are asked through their plain stop check so that an
    /// enclosing plateau detector only ever sees its own evaluations.
    pub fn should_stop_on(&self, evaluations: &[Evaluation]) -> bool {
        self.stop
            .is_some_and(|stop| stop.stop_on_evaluations(evaluations))
            || self.parent.is_some_and(|p| p.should_stop())
    }

    /// Number of enclosing contexts.
    pub fn depth(&self) -> usize {
        self.parent.map_or(0, |p| p.depth() + 1)
    }
}

impl Debug for SearchContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchContext")
            .field("thread_id", &self.thread_id)
            .field("depth", &self.depth())
            .field("has_stop", &self.stop.is_some())
            .finish()
    }
}
