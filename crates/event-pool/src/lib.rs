//! Fixed-size worker pool for change-event dispatch.
//!
//! Device servers push attribute change events from a small pool of named
//! worker threads rather than from the caller's thread, so a slow subscriber
//! cannot stall a device callback. This crate provides:
//!
//! - [`EventPool`]: a named pool of OS threads pulling boxed jobs from a
//!   shared queue, with an optional bound on queued jobs
//! - [`shared_pool`]: the process-wide pool, constructed exactly once on
//!   first use and alive for the process lifetime
//!
//! # Queue semantics
//!
//! The job queue is a bounded MPMC channel. [`EventPool::execute`] blocks
//! while the queue is full; [`EventPool::try_execute`] fails fast with
//! [`PoolError::QueueFull`] instead. A queue bound of `0` removes the bound.
//!
//! # Shutdown
//!
//! [`EventPool::shutdown`] closes the queue, lets the workers drain what is
//! already queued, and joins them. Dropping the pool does the same. The
//! shared pool is never shut down.
//!
//! # Example
//!
//! ```
//! use event_pool::EventPool;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pool = EventPool::new("push", 2, 100)?;
//! let hits = Arc::new(AtomicUsize::new(0));
//! for _ in 0..10 {
//!     let hits = Arc::clone(&hits);
//!     pool.execute(move || {
//!         hits.fetch_add(1, Ordering::SeqCst);
//!     })?;
//! }
//! pool.join();
//! assert_eq!(hits.load(Ordering::SeqCst), 10);
//! # Ok::<(), event_pool::PoolError>(())
//! ```

use crossbeam_channel::{Receiver, Sender, TrySendError};
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::warn;

/// Boxed unit of work submitted to the pool.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Name of the process-wide event pool.
pub const SHARED_POOL_NAME: &str = "event";

/// Queue bound of the process-wide event pool.
///
/// Event delivery must preserve ordering, so the shared pool runs a single
/// worker; the generous queue bound absorbs bursts from device callbacks.
pub const SHARED_POOL_QUEUE: usize = 1000;

static SHARED: OnceCell<EventPool> = OnceCell::new();

/// Errors raised when constructing a pool or submitting work to it.
#[derive(Error, Debug)]
pub enum PoolError {
    /// A pool must have at least one worker thread.
    #[error("pool must have at least one worker")]
    NoWorkers,

    /// Non-blocking submission found the job queue full.
    #[error("job queue is full")]
    QueueFull,

    /// The pool has been shut down and accepts no more work.
    #[error("pool has been shut down")]
    Terminated,

    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Bookkeeping shared between the pool handle and its workers.
struct PoolState {
    name: String,
    /// Jobs queued or running. Guards `join()`.
    outstanding: Mutex<usize>,
    idle: Condvar,
}

impl PoolState {
    fn job_finished(&self) {
        let mut outstanding = self.outstanding.lock();
        *outstanding -= 1;
        if *outstanding == 0 {
            self.idle.notify_all();
        }
    }
}

/// A named pool of worker threads executing submitted jobs in FIFO order.
pub struct EventPool {
    state: Arc<PoolState>,
    /// `None` once the pool has been shut down.
    sender: Mutex<Option<Sender<Job>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    workers: usize,
    queue_bound: usize,
}

impl EventPool {
    /// Create a pool of `workers` threads named `"{name}-{i}"`.
    ///
    /// `queue_bound` limits the number of queued jobs; `0` means unbounded.
    pub fn new(name: &str, workers: usize, queue_bound: usize) -> Result<Self, PoolError> {
        let workers = NonZeroUsize::new(workers).ok_or(PoolError::NoWorkers)?;
        Self::spawn(name, workers, queue_bound)
    }

    fn spawn(name: &str, workers: NonZeroUsize, queue_bound: usize) -> Result<Self, PoolError> {
        let (tx, rx) = if queue_bound == 0 {
            crossbeam_channel::unbounded()
        } else {
            crossbeam_channel::bounded(queue_bound)
        };

        let state = Arc::new(PoolState {
            name: name.to_owned(),
            outstanding: Mutex::new(0),
            idle: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(workers.get());
        for i in 0..workers.get() {
            let rx = rx.clone();
            let state = Arc::clone(&state);
            let handle = std::thread::Builder::new()
                .name(format!("{name}-{i}"))
                .spawn(move || worker_loop(&rx, &state))
                .map_err(PoolError::Spawn)?;
            handles.push(handle);
        }

        Ok(Self {
            state,
            sender: Mutex::new(Some(tx)),
            handles: Mutex::new(handles),
            workers: workers.get(),
            queue_bound,
        })
    }

    /// Submit a job, blocking while the queue is full.
    pub fn execute<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let tx = self.live_sender()?;
        *self.state.outstanding.lock() += 1;
        if tx.send(Box::new(job)).is_err() {
            self.state.job_finished();
            return Err(PoolError::Terminated);
        }
        Ok(())
    }

    /// Submit a job without blocking.
    pub fn try_execute<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let tx = self.live_sender()?;
        *self.state.outstanding.lock() += 1;
        match tx.try_send(Box::new(job)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.state.job_finished();
                Err(PoolError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.state.job_finished();
                Err(PoolError::Terminated)
            }
        }
    }

    /// Block until every queued and in-flight job has finished.
    pub fn join(&self) {
        let mut outstanding = self.state.outstanding.lock();
        while *outstanding > 0 {
            self.state.idle.wait(&mut outstanding);
        }
    }

    /// Close the queue, drain already-queued jobs, and join the workers.
    ///
    /// Submissions after this return [`PoolError::Terminated`]. Calling it
    /// twice is a no-op.
    pub fn shutdown(&self) {
        drop(self.sender.lock().take());
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if handle.join().is_err() {
                warn!(pool = %self.state.name, "worker thread terminated abnormally");
            }
        }
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Jobs currently waiting in the queue.
    pub fn pending(&self) -> usize {
        self.sender.lock().as_ref().map_or(0, Sender::len)
    }

    /// Queue bound this pool was created with (`0` = unbounded).
    pub fn queue_bound(&self) -> usize {
        self.queue_bound
    }

    /// Pool name, as used in worker thread names.
    pub fn name(&self) -> &str {
        &self.state.name
    }

    fn live_sender(&self) -> Result<Sender<Job>, PoolError> {
        self.sender.lock().as_ref().cloned().ok_or(PoolError::Terminated)
    }
}

impl Drop for EventPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for EventPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPool")
            .field("name", &self.state.name)
            .field("workers", &self.workers)
            .field("queue_bound", &self.queue_bound)
            .field("pending", &self.pending())
            .finish()
    }
}

fn worker_loop(rx: &Receiver<Job>, state: &PoolState) {
    while let Ok(job) = rx.recv() {
        // A panicking job must not take the worker down with it.
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            warn!(pool = %state.name, "job panicked");
        }
        state.job_finished();
    }
}

/// The process-wide event pool, constructed on first call.
///
/// Concurrent first callers are serialized by the cell; exactly one pool is
/// ever built and all callers observe the same instance. There is no
/// teardown path.
///
/// # Panics
///
/// Panics if the OS cannot spawn the worker thread on first use.
#[allow(clippy::panic)]
pub fn shared_pool() -> &'static EventPool {
    SHARED.get_or_init(|| {
        match EventPool::spawn(SHARED_POOL_NAME, NonZeroUsize::MIN, SHARED_POOL_QUEUE) {
            Ok(pool) => pool,
            Err(err) => panic!("failed to start shared event pool: {err}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_executes_submitted_jobs() {
        let pool = EventPool::new("test", 4, 0).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let hits = Arc::clone(&hits);
            pool.execute(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.join();
        assert_eq!(hits.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            EventPool::new("test", 0, 10),
            Err(PoolError::NoWorkers)
        ));
    }

    #[test]
    fn test_single_worker_preserves_order() {
        let pool = EventPool::new("test", 1, 0).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..50 {
            let seen = Arc::clone(&seen);
            pool.execute(move || seen.lock().push(i)).unwrap();
        }

        pool.join();
        assert_eq!(*seen.lock(), (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_try_execute_full_queue() {
        let pool = EventPool::new("test", 1, 1).unwrap();
        let gate = Arc::new(Mutex::new(()));

        // Hold the worker busy so the queue backs up.
        let held = gate.lock();
        {
            let gate = Arc::clone(&gate);
            pool.execute(move || {
                let _wait = gate.lock();
            })
            .unwrap();
        }
        // Give the worker time to pick up the blocking job, then fill the
        // single queue slot.
        std::thread::sleep(Duration::from_millis(50));
        pool.try_execute(|| {}).unwrap();

        assert!(matches!(pool.try_execute(|| {}), Err(PoolError::QueueFull)));
        drop(held);
        pool.join();
    }

    #[test]
    fn test_submit_after_shutdown() {
        let pool = EventPool::new("test", 1, 0).unwrap();
        pool.shutdown();
        assert!(matches!(pool.execute(|| {}), Err(PoolError::Terminated)));
        assert!(matches!(pool.try_execute(|| {}), Err(PoolError::Terminated)));
    }

    #[test]
    fn test_shutdown_drains_queued_jobs() {
        let pool = EventPool::new("test", 1, 0).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let hits = Arc::clone(&hits);
            pool.execute(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.shutdown();
        assert_eq!(hits.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let pool = EventPool::new("test", 1, 0).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        pool.execute(|| panic!("boom")).unwrap();
        {
            let hits = Arc::clone(&hits);
            pool.execute(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.join();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_thread_names() {
        let pool = EventPool::new("named", 1, 0).unwrap();
        let observed = Arc::new(Mutex::new(String::new()));
        {
            let observed = Arc::clone(&observed);
            pool.execute(move || {
                *observed.lock() = std::thread::current()
                    .name()
                    .unwrap_or_default()
                    .to_owned();
            })
            .unwrap();
        }
        pool.join();
        assert_eq!(*observed.lock(), "named-0");
    }

    #[test]
    fn test_shared_pool_single_instance_under_race() {
        let mut joins = Vec::new();
        for _ in 0..8 {
            joins.push(std::thread::spawn(|| shared_pool()));
        }
        let ptrs: Vec<_> = joins.into_iter().map(|j| j.join().unwrap()).collect();
        assert!(ptrs.windows(2).all(|w| std::ptr::eq(w[0], w[1])));
        assert_eq!(shared_pool().name(), SHARED_POOL_NAME);
        assert_eq!(shared_pool().workers(), 1);
    }
}
