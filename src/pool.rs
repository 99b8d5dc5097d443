use crate::error::{ErrorKind, Result};
use crate::queue::{Task, TaskQueue};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Report of a task that panicked inside a worker.
///
/// The worker survives the panic and keeps consuming the queue; failed tasks
/// are reported on the channel returned by [`WorkerPool::failures`].
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub worker: usize,
    pub reason: String,
}

/// A fixed set of threads consuming tasks from one shared FIFO queue.
///
/// Tasks are fire-and-forget: `submit` returns as soon as the task is queued
/// and nothing reports completion. Dequeue order is FIFO, completion order is
/// not defined. `stop` lets workers drain tasks that were already queued but
/// refuses everything submitted afterwards; a deferred task whose delay
/// expires after `stop` is dropped unexecuted.
pub struct WorkerPool {
    queue: Arc<TaskQueue>,
    workers: Mutex<Vec<Worker>>,
    size: usize,
    started: AtomicBool,
    failure_sender: Sender<TaskFailure>,
    failure_receiver: Receiver<TaskFailure>,
}

impl WorkerPool {
    pub fn new(size: usize) -> WorkerPool {
        let (failure_sender, failure_receiver) = unbounded();
        WorkerPool {
            queue: Arc::new(TaskQueue::new()),
            workers: Mutex::new(Vec::with_capacity(size)),
            size,
            started: AtomicBool::new(false),
            failure_sender,
            failure_receiver,
        }
    }

    /// Spawns the workers. Valid exactly once per pool; a pool cannot be
    /// restarted after `stop`.
    pub fn start(&self) -> Result<()> {
        if self.size == 0 {
            return Err(ErrorKind::ZeroSized.into());
        }
        if self.queue.is_stopping() {
            return Err(ErrorKind::Stopped.into());
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ErrorKind::AlreadyStarted.into());
        }
        let mut workers = self.lock_workers();
        for id in 0..self.size {
            workers.push(Worker::new(
                id,
                Arc::clone(&self.queue),
                self.failure_sender.clone(),
            ));
        }
        Ok(())
    }

    /// Queues a task for execution. Never blocks and never waits for the
    /// task to run; FIFO order is kept relative to this caller's own
    /// submissions only.
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        // since the task runs in a worker thread, it must have static lifetime
        F: Send + FnOnce() + 'static,
    {
        if self.queue.push(Box::new(task)) {
            Ok(())
        } else {
            Err(ErrorKind::Stopped.into())
        }
    }

    /// Queues `task` once `delay` has elapsed.
    ///
    /// The timer is a detached thread holding its own handle to the queue;
    /// it consumes no worker slot and cannot be cancelled. If the pool stops
    /// before the delay expires, the late push is refused and the task is
    /// dropped.
    pub fn submit_after<F>(&self, task: F, delay: Duration) -> Result<()>
    where
        F: Send + FnOnce() + 'static,
    {
        if self.queue.is_stopping() {
            return Err(ErrorKind::Stopped.into());
        }
        let queue = Arc::clone(&self.queue);
        let task: Task = Box::new(task);
        thread::spawn(move || {
            thread::sleep(delay);
            let _ = queue.push(task);
        });
        Ok(())
    }

    /// Requests shutdown: no new submissions are accepted, workers finish
    /// the queued backlog and exit. Idempotent; does not wait for workers.
    pub fn stop(&self) {
        self.queue.request_stop();
    }

    /// Blocks until every worker has exited its loop. Safe to call more than
    /// once; an already-joined worker is skipped.
    pub fn join(&self) -> Result<()> {
        let mut workers = self.lock_workers();
        let mut panicked = None;
        for worker in workers.iter_mut() {
            if worker.join().is_err() {
                panicked = Some(worker.id);
            }
        }
        workers.clear();
        match panicked {
            Some(id) => Err(ErrorKind::WorkerPanicked(id).into()),
            None => Ok(()),
        }
    }

    /// Receiver for per-task panic reports. The channel is unbounded and may
    /// be read from any thread; cloning the receiver shares one stream of
    /// reports.
    pub fn failures(&self) -> Receiver<TaskFailure> {
        self.failure_receiver.clone()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<Worker>> {
        match self.workers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// no worker outlives the pool
impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        let _ = self.join();
    }
}

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, queue: Arc<TaskQueue>, failures: Sender<TaskFailure>) -> Worker {
        let thread = thread::spawn(move || {
            do_work(id, queue, failures);
        });

        Worker {
            id,
            thread: Some(thread),
        }
    }

    fn join(&mut self) -> thread::Result<()> {
        match self.thread.take() {
            Some(thread) => thread.join(),
            None => Ok(()),
        }
    }
}

// dequeue-and-execute loop; exits when the queue reports no more work
fn do_work(id: usize, queue: Arc<TaskQueue>, failures: Sender<TaskFailure>) {
    while let Some(task) = queue.pop_blocking() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            // a panicking task must not kill the worker
            let _ = failures.send(TaskFailure {
                worker: id,
                reason: panic_reason(&payload),
            });
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
