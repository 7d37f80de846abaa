//! Dynamically sized blocking thread pool.
//!
//! The pool is the scheduling primitive under the server's workers:
//! queue a unit of work, block until drained. Threads are spawned on
//! demand up to a mutable ceiling and stay alive for the pool's
//! lifetime. A panic inside a task is caught and logged at the pool
//! boundary: one failing task can never take down a worker thread or
//! its siblings.

use crate::base::NetError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Task>,
    threads: usize,
    idle: usize,
    /// Queued plus in-flight tasks.
    pending: usize,
    max_threads: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    work_ready: Condvar,
    all_done: Condvar,
}

/// A pool of worker threads executing queued tasks.
pub struct ThreadPool {
    shared: Arc<Shared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    /// Makes the next spawn fail, to exercise the refusal path.
    #[cfg(test)]
    fail_next_spawn: std::sync::atomic::AtomicBool,
}

impl ThreadPool {
    /// Creates a pool that will spawn at most `max_threads` workers.
    pub fn new(max_threads: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    threads: 0,
                    idle: 0,
                    pending: 0,
                    max_threads: max_threads.max(1),
                    shutdown: false,
                }),
                work_ready: Condvar::new(),
                all_done: Condvar::new(),
            }),
            handles: Mutex::new(Vec::new()),
            #[cfg(test)]
            fail_next_spawn: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Enqueues one unit of work.
    ///
    /// Spawns a new worker thread when no worker is idle and the
    /// ceiling allows. If the OS refuses the spawn, the task is **not**
    /// enqueued and [`NetError::ThreadSpawn`] is returned; the caller
    /// may lower the ceiling with [`set_max_threads`](Self::set_max_threads)
    /// and retry against the existing workers.
    pub fn queue_task<F>(&self, task: F) -> Result<(), NetError>
    where
        F: FnOnce() + Send + 'static,
    {
        let need_spawn = {
            let mut state = self.shared.state.lock();
            let need = state.idle == 0 && state.threads < state.max_threads;
            if need {
                state.threads += 1;
            }
            need
        };

        if need_spawn {
            match self.spawn_worker() {
                Ok(handle) => self.handles.lock().push(handle),
                Err(e) => {
                    self.shared.state.lock().threads -= 1;
                    tracing::warn!(error = %e, "worker thread spawn failed");
                    return Err(NetError::ThreadSpawn {
                        source: Arc::new(e),
                    });
                }
            }
        }

        let mut state = self.shared.state.lock();
        state.pending += 1;
        state.queue.push_back(Box::new(task));
        drop(state);
        self.shared.work_ready.notify_one();
        Ok(())
    }

    /// Blocks until every task queued so far (and any in flight) has
    /// completed. Tasks queued concurrently by other callers may or may
    /// not be covered.
    pub fn block_for_tasks(&self) {
        let mut state = self.shared.state.lock();
        while state.pending > 0 {
            self.shared.all_done.wait(&mut state);
        }
    }

    /// Adjusts the thread ceiling. Shrinking never kills in-flight
    /// threads; it only suppresses new spawns.
    pub fn set_max_threads(&self, max_threads: usize) {
        self.shared.state.lock().max_threads = max_threads.max(1);
    }

    /// The current thread ceiling.
    pub fn max_threads(&self) -> usize {
        self.shared.state.lock().max_threads
    }

    /// Number of live worker threads.
    pub fn thread_count(&self) -> usize {
        self.shared.state.lock().threads
    }

    fn spawn_worker(&self) -> std::io::Result<JoinHandle<()>> {
        #[cfg(test)]
        if self
            .fail_next_spawn
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "spawn refused",
            ));
        }
        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name("forgenet-worker".into())
            .spawn(move || worker_loop(shared))
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            loop {
                if let Some(task) = state.queue.pop_front() {
                    break Some(task);
                }
                if state.shutdown {
                    break None;
                }
                state.idle += 1;
                shared.work_ready.wait(&mut state);
                state.idle -= 1;
            }
        };

        let Some(task) = task else { break };

        if catch_unwind(AssertUnwindSafe(task)).is_err() {
            tracing::error!("task panicked; swallowed at pool boundary");
        }

        let mut state = shared.state.lock();
        state.pending -= 1;
        if state.pending == 0 {
            shared.all_done.notify_all();
        }
    }

    shared.state.lock().threads -= 1;
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
        }
        self.shared.work_ready.notify_all();
        for handle in self.handles.lock().drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_single_task_completes() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        pool.queue_task(move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        pool.block_for_tasks();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_many_tasks_all_complete() {
        let pool = ThreadPool::new(8);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..25 {
            let c = Arc::clone(&counter);
            pool.queue_task(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.block_for_tasks();
        assert_eq!(counter.load(Ordering::SeqCst), 25);
    }

    #[test]
    fn test_spawn_ceiling_respected() {
        let pool = ThreadPool::new(3);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let c = Arc::clone(&counter);
            pool.queue_task(move || {
                thread::sleep(Duration::from_millis(1));
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert!(pool.thread_count() <= 3);
        pool.block_for_tasks();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn test_lowered_ceiling_still_drains() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for i in 0..100 {
            if i == 50 {
                pool.set_max_threads(1);
            }
            let c = Arc::clone(&counter);
            pool.queue_task(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.block_for_tasks();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert_eq!(pool.max_threads(), 1);
    }

    #[test]
    fn test_spawn_failure_leaves_task_unqueued() {
        let pool = ThreadPool::new(4);

        // Occupy the only worker so the next queue_task must spawn.
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        pool.queue_task(move || {
            let _ = release_rx.recv();
        })
        .unwrap();

        pool.fail_next_spawn.store(true, Ordering::SeqCst);
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let err = pool
            .queue_task(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap_err();
        assert!(matches!(err, NetError::ThreadSpawn { .. }));
        assert_eq!(pool.thread_count(), 1);

        // Lower the ceiling and retry against the existing worker.
        pool.set_max_threads(1);
        let c = Arc::clone(&counter);
        pool.queue_task(move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        release_tx.send(()).unwrap();
        pool.block_for_tasks();
        // Only the retried task ran; the refused one was never queued.
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_task_panic_is_swallowed() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        pool.queue_task(|| panic!("deliberate")).unwrap();
        let c = Arc::clone(&counter);
        pool.queue_task(move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        pool.block_for_tasks();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_joins_workers() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = ThreadPool::new(2);
            for _ in 0..10 {
                let c = Arc::clone(&counter);
                pool.queue_task(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
        }
        // Drop drained the queue and joined every worker.
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }
}
