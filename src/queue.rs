use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

pub type Task = Box<dyn Send + FnOnce() + 'static>;

struct Inner {
    tasks: VecDeque<Task>,
    stopping: bool,
}

/// FIFO of pending tasks shared between submitters and workers.
///
/// One mutex guards both the queue and the stop flag, so workers observe
/// "stopping and empty" atomically. The lock is held only to append, remove
/// or check the flag, never while a task runs.
pub struct TaskQueue {
    inner: Mutex<Inner>,
    ready: Condvar,
}

impl TaskQueue {
    pub fn new() -> TaskQueue {
        TaskQueue {
            inner: Mutex::new(Inner {
                tasks: VecDeque::new(),
                stopping: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Appends a task at the tail and wakes one waiting worker.
    ///
    /// The queue is unbounded and never blocks the caller. Returns `false`
    /// once a stop has been requested; the task is dropped unexecuted.
    pub fn push(&self, task: Task) -> bool {
        let mut inner = self.lock();
        if inner.stopping {
            return false;
        }
        inner.tasks.push_back(task);
        drop(inner);
        self.ready.notify_one();
        true
    }

    /// Blocks until a task is available or the queue is stopping.
    ///
    /// Returns `None` only when stopping has been requested and the queue has
    /// drained empty; the caller must exit its loop on `None`. The predicate
    /// is re-checked after every wake, so spurious wakeups and races with
    /// other workers are harmless.
    pub fn pop_blocking(&self) -> Option<Task> {
        let mut inner = self.lock();
        loop {
            if let Some(task) = inner.tasks.pop_front() {
                return Some(task);
            }
            if inner.stopping {
                return None;
            }
            inner = match self.ready.wait(inner) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Sets the stop flag and wakes every waiting worker.
    pub fn request_stop(&self) {
        let mut inner = self.lock();
        inner.stopping = true;
        drop(inner);
        self.ready.notify_all();
    }

    pub fn is_stopping(&self) -> bool {
        self.lock().stopping
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    // tasks run outside the lock and panics are caught in the worker loop,
    // so a poisoned mutex still holds a consistent queue
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        TaskQueue::new()
    }
}
