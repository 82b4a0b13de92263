//! Bounded blocking task pool
//!
//! Hosts fire-and-forget background work, such as probing candidate plugin
//! backends during device discovery, on a fixed set of OS threads so that
//! blocking calls never stall the request-handling event loop.
//!
//! The submission queue is bounded at the worker count: when it is full,
//! `submit` blocks the submitter until a slot frees, which keeps runaway
//! discovery fan-out from growing memory without limit. A task that panics
//! is logged, counted on the failure counter, and the worker moves on to the
//! next item; one failing task never takes a worker down.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Job>,
    /// Jobs queued or currently executing
    outstanding: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    not_empty: Condvar,
    not_full: Condvar,
    drained: Condvar,
    capacity: usize,
    failures: AtomicU64,
}

/// Fixed-size pool of background worker threads with a bounded queue.
///
/// Worker count is fixed at construction; there is no dynamic resizing.
/// Dropping the pool waits for queued work to finish, then stops the
/// workers.
pub struct TaskPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskPool {
    /// Create a pool with `workers` threads and a queue bounded at the same
    /// size
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue: VecDeque::with_capacity(workers),
                outstanding: 0,
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            drained: Condvar::new(),
            capacity: workers,
            failures: AtomicU64::new(0),
        });

        let handles = (0..workers)
            .map(|index| {
                let shared = shared.clone();
                std::thread::Builder::new()
                    .name(format!("task-pool-{}", index))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn task pool worker")
            })
            .collect();

        Self {
            shared,
            workers: handles,
        }
    }

    /// Enqueue a task. Blocks the submitter while the queue is full.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.shared.state.lock();
        while state.queue.len() >= self.shared.capacity {
            self.shared.not_full.wait(&mut state);
        }
        state.queue.push_back(Box::new(task));
        state.outstanding += 1;
        drop(state);
        self.shared.not_empty.notify_one();
    }

    /// Submit one task per item, applying `task` to each
    pub fn map<T, F>(&self, task: F, items: impl IntoIterator<Item = T>)
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let task = Arc::new(task);
        for item in items {
            let task = task.clone();
            self.submit(move || task(item));
        }
    }

    /// Block until every submitted task has completed
    pub fn await_drain(&self) {
        let mut state = self.shared.state.lock();
        while state.outstanding > 0 {
            self.shared.drained.wait(&mut state);
        }
    }

    /// Number of tasks that panicked since the pool was created.
    ///
    /// Failures are swallowed at the pool boundary; this counter is the
    /// observable record that they happened.
    pub fn failures(&self) -> u64 {
        self.shared.failures.load(Ordering::Relaxed)
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
        }
        self.shared.not_empty.notify_all();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if let Some(job) = state.queue.pop_front() {
                    break job;
                }
                if state.shutdown {
                    return;
                }
                shared.not_empty.wait(&mut state);
            }
        };
        shared.not_full.notify_one();

        let result = panic::catch_unwind(AssertUnwindSafe(job));
        if let Err(payload) = result {
            shared.failures.fetch_add(1, Ordering::Relaxed);
            let message = panic_message(&payload);
            tracing::error!(error = %message, "Background task failed");
        }

        let mut state = shared.state.lock();
        state.outstanding -= 1;
        if state.outstanding == 0 {
            shared.drained.notify_all();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
