use crate::error::PoolError;
use crate::notifier::CompletionNotifier;
use crate::task_queue::{Popped, TaskQueue};

use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use dashmap::DashMap;
use tracing::{debug, info, info_span};

/// State shared between the pool handle and its worker threads.
#[derive(Debug)]
pub(crate) struct Shared {
  pub(crate) pool_name: Arc<String>,
  pub(crate) queue: TaskQueue,
  /// Busy workers, keyed by worker id, holding the id of the task they run.
  pub(crate) active_tasks: DashMap<usize, u64>,
  pub(crate) notifier: CompletionNotifier,
}

/// One long-lived pool thread.
#[derive(Debug)]
pub(crate) struct Worker {
  pub(crate) id: usize,
  pub(crate) thread: JoinHandle<()>,
}

impl Worker {
  pub(crate) fn spawn(
    id: usize,
    thread_name: String,
    stack_size: Option<usize>,
    shared: Arc<Shared>,
  ) -> Result<Self, PoolError> {
    let mut builder = thread::Builder::new().name(thread_name);
    if let Some(size) = stack_size {
      builder = builder.stack_size(size);
    }
    let thread = builder
      .spawn(move || run_worker_loop(id, shared))
      .map_err(|e| PoolError::WorkerSpawn(e.to_string()))?;
    Ok(Self { id, thread })
  }

  pub(crate) fn thread_id(&self) -> ThreadId {
    self.thread.thread().id()
  }
}

fn run_worker_loop(worker_id: usize, shared: Arc<Shared>) {
  let span = info_span!("pool_worker", pool_name = %*shared.pool_name, worker_id);
  let _entered = span.enter();
  info!("Worker started.");

  loop {
    let job = match shared.queue.pop_blocking() {
      Popped::Job(job) => job,
      Popped::Shutdown => break,
    };

    let task_id = job.task_id;
    debug!(%task_id, "Dequeued task.");
    shared.active_tasks.insert(worker_id, task_id);

    let status = job.run();
    shared.notifier.notify(task_id, Some(worker_id), status);

    shared.active_tasks.remove(&worker_id);
    debug!(%task_id, ?status, "Task finished processing.");
  }

  info!("Shutdown signal received with no task claimed. Worker exiting.");
}
