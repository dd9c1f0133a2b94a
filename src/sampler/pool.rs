//! Shared pool that runs periodic tasks at a fixed rate.
//!
//! The pool owns a small, bounded set of worker threads and a queue of
//! scheduled entries ordered by deadline. A task sits in the queue at most
//! once: a worker removes it, runs one tick, and only then re-queues it. Two
//! ticks of the same task therefore never overlap, and because the task state
//! lives behind its own mutex, tick `n` is fully visible to tick `n + 1` even
//! when they run on different workers.

use crate::utils::config::MAX_POOL_THREADS;
use crate::utils::error::SamplerError;
use log::{debug, warn};
use std::any::Any;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Work executed once per period
pub trait Periodic: Send + 'static {
    fn tick(&mut self);
}

/// Object-safe view of a scheduled task, as seen by the workers
trait Runnable: Send + Sync {
    /// Run one tick; returns whether the task wants to be scheduled again
    fn run_once(&self) -> bool;

    fn period(&self) -> Duration;
}

struct TaskCell<T> {
    state: Mutex<Option<T>>,
    cancelled: AtomicBool,
    period: Duration,
}

impl<T: Periodic> Runnable for TaskCell<T> {
    fn run_once(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return false;
        }

        let mut state = lock(&self.state);
        let Some(task) = state.as_mut() else {
            return false;
        };

        // A panicking tick must not kill the worker or the schedule.
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task.tick())) {
            warn!("Periodic task panicked: {}", panic_message(payload.as_ref()));
        }

        !self.cancelled.load(Ordering::Acquire)
    }

    fn period(&self) -> Duration {
        self.period
    }
}

/// Handle to a scheduled task
///
/// Dropping the handle cancels the task without waiting.
pub struct TaskHandle<T: Periodic> {
    cell: Arc<TaskCell<T>>,
}

impl<T: Periodic> TaskHandle<T> {
    /// Cancel future ticks and take the task state back
    ///
    /// Blocks only while a tick is in flight. Every write made by earlier
    /// ticks is visible to the caller once this returns.
    pub fn cancel(self) -> Option<T> {
        self.cell.cancelled.store(true, Ordering::Release);
        let taken = lock(&self.cell.state).take();
        taken
    }

    pub fn is_cancelled(&self) -> bool {
        self.cell.cancelled.load(Ordering::Acquire)
    }
}

impl<T: Periodic> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        self.cell.cancelled.store(true, Ordering::Release);
    }
}

struct Entry {
    deadline: Instant,
    seq: u64,
    task: Arc<dyn Runnable>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // BinaryHeap is a max-heap; the earliest deadline must compare greatest.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Shared {
    queue: Mutex<BinaryHeap<Entry>>,
    wakeup: Condvar,
    next_seq: AtomicU64,
    shutdown: AtomicBool,
}

impl Shared {
    fn push(&self, deadline: Instant, task: Arc<dyn Runnable>) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        lock(&self.queue).push(Entry {
            deadline,
            seq,
            task,
        });
        self.wakeup.notify_one();
    }

    /// Block until the earliest entry is due and remove it
    ///
    /// Returns `None` once the pool is shutting down.
    fn next_due(&self) -> Option<Entry> {
        let mut queue = lock(&self.queue);
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                return None;
            }
            let now = Instant::now();
            match queue.peek().map(|entry| entry.deadline) {
                Some(deadline) if deadline <= now => {
                    if let Some(entry) = queue.pop() {
                        return Some(entry);
                    }
                }
                Some(deadline) => {
                    queue = self
                        .wakeup
                        .wait_timeout(queue, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
                None => {
                    queue = self
                        .wakeup
                        .wait(queue)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }
}

/// Fixed-size pool of sampling workers
pub struct SamplingPool {
    shared: Arc<Shared>,
    workers: usize,
}

impl SamplingPool {
    /// Create a pool with `workers` threads
    pub fn new(workers: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(BinaryHeap::new()),
            wakeup: Condvar::new(),
            next_seq: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        });

        let mut spawned = 0;
        for index in 0..workers.max(1) {
            let shared = Arc::clone(&shared);
            let result = thread::Builder::new()
                .name(format!("stackprobe-sampler-{}", index))
                .spawn(move || worker_loop(&shared));
            match result {
                Ok(_) => spawned += 1,
                Err(e) => warn!("Failed to spawn sampling worker {}: {}", index, e),
            }
        }

        debug!("Sampling pool started with {} worker(s)", spawned);
        Self {
            shared,
            workers: spawned,
        }
    }

    /// Process-wide pool shared by every sampler
    pub fn global() -> &'static SamplingPool {
        static POOL: OnceLock<SamplingPool> = OnceLock::new();
        POOL.get_or_init(|| SamplingPool::new(default_worker_count()))
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` every `period`, first tick one period from now
    ///
    /// # Errors
    /// * `SamplerError::InvalidPeriod` - period is zero
    /// * `SamplerError::PoolUnavailable` - no worker thread could be spawned
    pub fn schedule<T: Periodic>(
        &self,
        task: T,
        period: Duration,
    ) -> Result<TaskHandle<T>, SamplerError> {
        if period.is_zero() {
            return Err(SamplerError::InvalidPeriod(period));
        }
        if self.workers == 0 {
            return Err(SamplerError::PoolUnavailable);
        }

        let cell = Arc::new(TaskCell {
            state: Mutex::new(Some(task)),
            cancelled: AtomicBool::new(false),
            period,
        });
        self.shared
            .push(Instant::now() + period, Arc::clone(&cell) as Arc<dyn Runnable>);

        Ok(TaskHandle { cell })
    }
}

impl Drop for SamplingPool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        let _queue = lock(&self.shared.queue);
        self.shared.wakeup.notify_all();
    }
}

fn worker_loop(shared: &Shared) {
    while let Some(entry) = shared.next_due() {
        if !entry.task.run_once() {
            continue;
        }

        let period = entry.task.period();
        let now = Instant::now();
        let mut deadline = entry.deadline + period;
        // Fixed rate; ticks missed while running late are skipped, not replayed.
        while deadline <= now {
            deadline += period;
        }
        shared.push(deadline, entry.task);
    }
}

fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_POOL_THREADS)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
