//! Per-thread random streams and worker fan-out.
//!
//! A [`ThreadManager`] owns one independent random stream per logical
//! thread id. Stream `i` is seeded with `seed + i` when a seed is given,
//! so identical seeds reproduce identical per-thread trajectories no
//! matter how the OS schedules the real threads.
//!
//! Each worker is pinned to one thread id, thus the per-stream mutex is
//! never contended; it only makes the manager shareable by reference.

use std::fmt::{self, Debug};
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error};

use crate::error::{MetaforgeError, Result};

/// Registry of per-thread random streams.
///
/// # Example
///
/// ```
/// use metaforge_core::ThreadManager;
///
/// let first = ThreadManager::new(2, Some(7)).unwrap();
/// let second = ThreadManager::new(2, Some(7)).unwrap();
///
/// assert_eq!(first.next_f64(1), second.next_f64(1));
/// ```
pub struct ThreadManager {
    seed: Option<u64>,
    streams: Vec<Mutex<ChaCha8Rng>>,
}

/// Whether a fan-out runs its callbacks on the calling thread or in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    Sequential,
    Parallel,
}

impl ThreadManager {
    /// Creates `thread_count` streams, seeded from `seed` or from OS entropy.
    pub fn new(thread_count: usize, seed: Option<u64>) -> Result<Self> {
        if thread_count == 0 {
            return Err(MetaforgeError::Configuration(
                "thread count must be at least 1".to_string(),
            ));
        }
        let streams = (0..thread_count)
            .map(|i| {
                let rng = match seed {
                    Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64)),
                    None => ChaCha8Rng::from_os_rng(),
                };
                Mutex::new(rng)
            })
            .collect();
        debug!(event = "thread_streams", threads = thread_count, seed = ?seed);
        Ok(Self { seed, streams })
    }

    /// Creates a single-stream manager for sequential searches.
    pub fn single(seed: Option<u64>) -> Self {
        Self {
            seed,
            streams: vec![Mutex::new(match seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_os_rng(),
            })],
        }
    }

    pub fn thread_count(&self) -> usize {
        self.streams.len()
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns a handle drawing from the stream of `thread_id`.
    pub fn random(&self, thread_id: usize) -> ThreadRandom<'_> {
        ThreadRandom {
            manager: self,
            thread_id,
        }
    }

    /// Uniform draw in `[0, 1)` from the stream of `thread_id`.
    ///
    /// # Panics
    ///
    /// Panics if `thread_id` is not below [`ThreadManager::thread_count`].
    pub fn next_f64(&self, thread_id: usize) -> f64 {
        self.stream(thread_id).random::<f64>()
    }

    /// Uniform integer in `range`; an empty range yields its start.
    ///
    /// # Panics
    ///
    /// Panics if `thread_id` is not below [`ThreadManager::thread_count`].
    pub fn next_in_range(&self, thread_id: usize, range: Range<usize>) -> usize {
        if range.is_empty() {
            return range.start;
        }
        self.stream(thread_id).random_range(range)
    }

    /// Shuffles `items` with the stream of `thread_id`.
    pub fn shuffle<T>(&self, thread_id: usize, items: &mut [T]) {
        items.shuffle(&mut *self.stream(thread_id));
    }

    fn stream(&self, thread_id: usize) -> MutexGuard<'_, ChaCha8Rng> {
        self.streams[thread_id]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks that thread ids `first..first + count` all have a stream.
    pub fn ensure_threads(&self, first: usize, count: usize) -> Result<()> {
        if first + count > self.thread_count() {
            return Err(MetaforgeError::Configuration(format!(
                "thread ids {}..{} exceed the {} configured streams",
                first,
                first + count,
                self.thread_count()
            )));
        }
        Ok(())
    }

    /// Runs `f` once per index in `range` and collects the results in index order.
    ///
    /// With [`FanOut::Parallel`] every index gets its own scoped thread and
    /// the call returns when all of them are done.
    pub fn fan_out<R, F>(&self, range: Range<usize>, mode: FanOut, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync,
    {
        match mode {
            FanOut::Sequential => range.map(f).collect(),
            FanOut::Parallel => thread::scope(|scope| {
                let f = &f;
                let handles: Vec<_> = range.map(|i| scope.spawn(move || f(i))).collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                    .collect()
            }),
        }
    }

    /// Runs a pool of persistent workers for the duration of `body`.
    ///
    /// Each worker state `W` lives on its own scoped thread. `body` submits
    /// jobs through the [`WorkerPool`] and waits for results with
    /// [`WorkerPool::wait_any`] or [`WorkerPool::wait_all`]; `handler` is
    /// called on the worker thread with the worker index, its state and the
    /// job. Once `body` returns the workers are shut down and their states
    /// are handed back in index order.
    ///
    /// A panic inside `handler` is re-raised on the calling thread when its
    /// result is collected.
    pub fn run_workers<W, J, R, H, B, T>(&self, workers: Vec<W>, handler: H, body: B) -> (T, Vec<W>)
    where
        W: Send,
        J: Send,
        R: Send,
        H: Fn(usize, &mut W, J) -> R + Sync,
        B: FnOnce(&mut WorkerPool<J, R>) -> T,
    {
        let worker_count = workers.len();
        let (result_tx, result_rx) = channel::unbounded();

        thread::scope(|scope| {
            let handler = &handler;
            let mut senders = Vec::with_capacity(worker_count);
            let mut handles = Vec::with_capacity(worker_count);

            for (index, mut state) in workers.into_iter().enumerate() {
                let (job_tx, job_rx) = channel::unbounded::<J>();
                let result_tx: Sender<(usize, thread::Result<R>)> = result_tx.clone();
                senders.push(job_tx);
                handles.push(scope.spawn(move || {
                    for job in job_rx.iter() {
                        let outcome =
                            panic::catch_unwind(AssertUnwindSafe(|| handler(index, &mut state, job)));
                        let panicked = outcome.is_err();
                        if result_tx.send((index, outcome)).is_err() || panicked {
                            break;
                        }
                    }
                    state
                }));
            }
            drop(result_tx);

            let mut pool = WorkerPool {
                jobs: senders,
                results: result_rx,
                busy: vec![false; worker_count],
            };
            let output = body(&mut pool);
            drop(pool);

            let states = handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                .collect();
            (output, states)
        })
    }
}

impl Debug for ThreadManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadManager")
            .field("seed", &self.seed)
            .field("thread_count", &self.streams.len())
            .finish()
    }
}

/// Borrowed handle onto one thread's random stream.
#[derive(Clone, Copy)]
pub struct ThreadRandom<'a> {
    manager: &'a ThreadManager,
    thread_id: usize,
}

impl<'a> ThreadRandom<'a> {
    pub fn thread_id(&self) -> usize {
        self.thread_id
    }

    pub fn manager(&self) -> &'a ThreadManager {
        self.manager
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_f64(&self) -> f64 {
        self.manager.next_f64(self.thread_id)
    }

    /// Uniform integer in `range`; an empty range yields its start.
    pub fn next_in_range(&self, range: Range<usize>) -> usize {
        self.manager.next_in_range(self.thread_id, range)
    }

    pub fn shuffle<T>(&self, items: &mut [T]) {
        self.manager.shuffle(self.thread_id, items);
    }
}

impl Debug for ThreadRandom<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadRandom")
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

/// Job dispatcher handed to the body of [`ThreadManager::run_workers`].
pub struct WorkerPool<J, R> {
    jobs: Vec<Sender<J>>,
    results: Receiver<(usize, thread::Result<R>)>,
    busy: Vec<bool>,
}

impl<J, R> WorkerPool<J, R> {
    pub fn worker_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_busy(&self, worker: usize) -> bool {
        self.busy[worker]
    }

    /// Number of submitted jobs whose result has not been collected.
    pub fn in_flight(&self) -> usize {
        self.busy.iter().filter(|b| **b).count()
    }

    /// Indices of workers without a job in flight.
    pub fn idle_workers(&self) -> Vec<usize> {
        (0..self.busy.len()).filter(|w| !self.busy[*w]).collect()
    }

    /// Hands `job` to an idle worker.
    pub fn submit(&mut self, worker: usize, job: J) -> Result<()> {
        if self.busy[worker] {
            return Err(MetaforgeError::WorkerFailed(format!(
                "worker {} already has a job in flight",
                worker
            )));
        }
        self.jobs[worker]
            .send(job)
            .map_err(|_| MetaforgeError::WorkerFailed(format!("worker {} has stopped", worker)))?;
        self.busy[worker] = true;
        Ok(())
    }

    /// Blocks until at least one result is ready, then drains every ready result.
    ///
    /// Returns an empty list when nothing is in flight.
    pub fn wait_any(&mut self) -> Result<Vec<(usize, R)>> {
        if self.in_flight() == 0 {
            return Ok(Vec::new());
        }
        let first = self.results.recv().map_err(|_| {
            MetaforgeError::WorkerFailed("all workers stopped before reporting".to_string())
        })?;
        let mut ready = vec![self.collect(first)];
        loop {
            match self.results.try_recv() {
                Ok(message) => ready.push(self.collect(message)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(ready)
    }

    /// Blocks until every in-flight job has reported; results are in worker order.
    pub fn wait_all(&mut self) -> Result<Vec<(usize, R)>> {
        let mut ready = Vec::with_capacity(self.in_flight());
        while self.in_flight() > 0 {
            let message = self.results.recv().map_err(|_| {
                MetaforgeError::WorkerFailed("all workers stopped before reporting".to_string())
            })?;
            ready.push(self.collect(message));
        }
        ready.sort_by_key(|(worker, _)| *worker);
        Ok(ready)
    }

    fn collect(&mut self, (worker, outcome): (usize, thread::Result<R>)) -> (usize, R) {
        self.busy[worker] = false;
        match outcome {
            Ok(result) => (worker, result),
            Err(payload) => {
                error!(event = "worker_panicked", worker);
                panic::resume_unwind(payload)
            }
        }
    }
}

impl<J, R> Debug for WorkerPool<J, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.jobs.len())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
