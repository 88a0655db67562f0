use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::handle::TaskHandle;
use crate::notifier::{CompletionNotifier, TaskCompletionInfo, TaskCompletionStatus};
use crate::task::Job;
use crate::task_queue::TaskQueue;
use crate::worker::{Shared, Worker};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use futures::channel::oneshot;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, trace, warn};

lazy_static::lazy_static! {
  static ref NEXT_POOL_TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);
}

/// Defines what happens to tasks still queued when the pool shuts down.
///
/// Tasks already running always finish; there is no cancellation of claimed work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownMode {
  /// Workers keep running queued tasks until the queue is empty, then exit.
  #[default]
  Drain,
  /// Queued tasks are discarded; their handles report `PoolError::TaskAbandoned`.
  Abandon,
}

/// Lifecycle of a `WorkerPool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
  /// Accepting and executing tasks.
  Running,
  /// Shutdown requested; no new tasks are accepted.
  Stopping,
  /// Every worker thread has exited, except a worker that called `shutdown`
  /// itself from inside a task. That worker exits once its current task returns.
  Stopped,
}

/// A fixed-size pool of worker threads fed from a shared FIFO queue.
///
/// The pool is an owned value: share it with `Arc<WorkerPool>` when tasks
/// themselves need to submit work. Dropping a pool that was not shut down
/// performs a shutdown with the configured `drop_mode`.
///
/// # Blocking on sibling tasks
///
/// A task must not block waiting for another task submitted to the same pool.
/// Once every worker is blocked this way, the tasks they wait on can never be
/// claimed and the pool stalls permanently. This is not detected at runtime.
pub struct WorkerPool {
  shared: Arc<Shared>,
  size: usize,
  drop_mode: ShutdownMode,
  worker_thread_ids: Vec<ThreadId>,
  workers: Mutex<Vec<Worker>>,
  lifecycle: Mutex<Lifecycle>,
  stopped: Condvar,
}

impl fmt::Debug for WorkerPool {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WorkerPool")
      .field("name", &*self.shared.pool_name)
      .field("size", &self.size)
      .field("state", &*self.lifecycle.lock())
      .field("queued", &self.shared.queue.len())
      .field("active", &self.shared.active_tasks.len())
      .field("accepting", &!self.shared.queue.is_closed())
      .finish()
  }
}

impl WorkerPool {
  /// Creates a pool of `max(size, 2)` workers named `pool_name`.
  pub fn new(size: usize, pool_name: &str) -> Result<Self, PoolError> {
    Self::with_config(PoolConfig::new(size, pool_name))
  }

  /// Creates a pool from a full configuration, spawning every worker eagerly.
  ///
  /// # Errors
  /// Returns `PoolError::WorkerSpawn` if a worker thread cannot be spawned. Workers
  /// spawned before the failure are stopped before returning.
  pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
    let size = config.effective_size();
    let pool_name = Arc::new(config.name.clone());
    let shared = Arc::new(Shared {
      pool_name: pool_name.clone(),
      queue: TaskQueue::new(),
      active_tasks: DashMap::new(),
      notifier: CompletionNotifier::new(pool_name.clone()),
    });

    let mut workers = Vec::with_capacity(size);
    for worker_id in 0..size {
      let thread_name = format!("{}-{}", config.thread_name_prefix, worker_id);
      match Worker::spawn(worker_id, thread_name, config.stack_size, shared.clone()) {
        Ok(worker) => workers.push(worker),
        Err(e) => {
          error!(pool_name = %*pool_name, %worker_id, "Failed to spawn worker: {}", e);
          shared.queue.close(ShutdownMode::Drain);
          for worker in workers {
            let spawned_id = worker.id;
            if let Err(join_err) = worker.thread.join() {
              error!(pool_name = %*pool_name, worker_id = spawned_id, "Error joining worker after spawn failure: {:?}", join_err);
            }
          }
          return Err(e);
        }
      }
    }

    info!(pool_name = %*pool_name, %size, "Worker pool started.");
    Ok(Self {
      shared,
      size,
      drop_mode: config.drop_mode,
      worker_thread_ids: workers.iter().map(Worker::thread_id).collect(),
      workers: Mutex::new(workers),
      lifecycle: Mutex::new(Lifecycle::Running),
      stopped: Condvar::new(),
    })
  }

  pub fn name(&self) -> &str {
    &self.shared.pool_name
  }

  /// Number of worker threads, after the minimum-of-two floor.
  pub fn size(&self) -> usize {
    self.size
  }

  pub fn state(&self) -> Lifecycle {
    *self.lifecycle.lock()
  }

  /// Returns the number of tasks currently being executed by workers.
  pub fn active_task_count(&self) -> usize {
    self.shared.active_tasks.len()
  }

  /// Returns the current number of tasks in the pending queue.
  pub fn queued_task_count(&self) -> usize {
    self.shared.queue.len()
  }

  /// Registers a handler invoked after every task completion or abandonment.
  ///
  /// Handlers run on the thread reporting the completion and should be quick.
  pub fn add_completion_handler(&self, handler: impl Fn(TaskCompletionInfo) + Send + Sync + 'static) {
    self.shared.notifier.add_handler(handler);
  }

  /// Queues `func` for execution on a worker and returns a handle to its result.
  ///
  /// Arguments are bound by capturing them in the closure. A panic inside `func`
  /// is reported through the handle as `PoolError::TaskPanicked`.
  ///
  /// The returned handle must not be waited on from inside another task of this
  /// pool (see the type-level docs).
  ///
  /// # Errors
  /// Returns `PoolError::PoolClosed` if shutdown has begun; the task is not queued.
  pub fn submit<F, R>(&self, func: F) -> Result<TaskHandle<R>, PoolError>
  where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
  {
    let task_id = NEXT_POOL_TASK_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    let (result_tx, result_rx) = oneshot::channel();

    match self.shared.queue.push(Job::new(task_id, func, result_tx)) {
      Ok(()) => {
        debug!(pool_name = %*self.shared.pool_name, %task_id, "Submitted task to queue.");
        Ok(TaskHandle::new(task_id, result_rx))
      }
      Err(_rejected) => {
        warn!(pool_name = %*self.shared.pool_name, %task_id, "Submit: Attempted to submit task to a pool that is shutting down or closed.");
        Err(PoolError::PoolClosed)
      }
    }
  }

  /// Stops the pool and blocks until its workers have exited.
  ///
  /// Only the first call applies `mode`. Later or concurrent calls wait for that
  /// shutdown to complete. When called from one of this pool's own workers, the
  /// calling worker is neither joined nor waited for; it exits once its current
  /// task returns.
  pub fn shutdown(&self, mode: ShutdownMode) {
    let current_thread = thread::current().id();
    let on_worker_thread = self.worker_thread_ids.contains(&current_thread);

    let abandoned = {
      let mut lifecycle = self.lifecycle.lock();
      if *lifecycle != Lifecycle::Running {
        info!(pool_name = %*self.shared.pool_name, "Shutdown already in progress or completed.");
        if !on_worker_thread {
          while *lifecycle != Lifecycle::Stopped {
            self.stopped.wait(&mut lifecycle);
          }
        }
        return;
      }
      // Admission closes under the same guard, so `Stopping` is never observed
      // while `submit` can still succeed.
      *lifecycle = Lifecycle::Stopping;
      self.shared.queue.close(mode)
    };

    info!(pool_name = %*self.shared.pool_name, "Pool shutdown initiated (mode: {:?}).", mode);
    if !abandoned.is_empty() {
      warn!(pool_name = %*self.shared.pool_name, "Abandoning {} queued tasks.", abandoned.len());
    }
    for job in abandoned {
      let task_id = job.task_id;
      // Dropping the job drops its result sender, which breaks the handle.
      drop(job);
      self.shared.notifier.notify(task_id, None, TaskCompletionStatus::Abandoned);
    }

    let workers = std::mem::take(&mut *self.workers.lock());
    info!(pool_name = %*self.shared.pool_name, "Waiting for {} workers to join.", workers.len());
    for worker in workers {
      let worker_id = worker.id;
      if worker.thread_id() == current_thread {
        trace!(pool_name = %*self.shared.pool_name, %worker_id, "Shutdown called from this worker; not joining itself.");
        continue;
      }
      if let Err(e) = worker.thread.join() {
        error!(pool_name = %*self.shared.pool_name, %worker_id, "Error joining worker during shutdown: {:?}", e);
      }
    }

    *self.lifecycle.lock() = Lifecycle::Stopped;
    self.stopped.notify_all();
    info!(pool_name = %*self.shared.pool_name, "Pool shutdown completed.");
  }
}

impl Drop for WorkerPool {
  fn drop(&mut self) {
    let running = *self.lifecycle.lock() == Lifecycle::Running;
    if running {
      info!(
        pool_name = %*self.shared.pool_name,
        "WorkerPool dropped while running. Initiating implicit shutdown (mode: {:?}).",
        self.drop_mode
      );
      self.shutdown(self.drop_mode);
    } else {
      trace!(pool_name = %*self.shared.pool_name, "Drop: Shutdown already in progress or completed.");
    }
  }
}
