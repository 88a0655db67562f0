use crate::error::PoolError;
use crate::notifier::TaskCompletionStatus;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use futures::channel::oneshot;
use tracing::{error, trace, warn};

/// The outcome delivered through a task's result channel.
pub(crate) type TaskOutcome<R> = Result<R, PoolError>;

/// A unit of work that runs exactly once on a pool worker.
///
/// Implemented by [`ManagedTask`] for every submitted closure so the queue can
/// hold tasks of different result types side by side.
pub(crate) trait Runnable: Send + 'static {
  /// Runs the task, delivering its outcome, and reports how it finished.
  fn run(self: Box<Self>) -> TaskCompletionStatus;
}

/// A submitted closure paired with the sending half of its result channel.
pub(crate) struct ManagedTask<F, R> {
  pub(crate) task_id: u64,
  pub(crate) func: F,
  pub(crate) result_sender: oneshot::Sender<TaskOutcome<R>>,
}

impl<F, R> Runnable for ManagedTask<F, R>
where
  F: FnOnce() -> R + Send + 'static,
  R: Send + 'static,
{
  fn run(self: Box<Self>) -> TaskCompletionStatus {
    let ManagedTask {
      task_id,
      func,
      result_sender,
    } = *self;

    let outcome = match panic::catch_unwind(AssertUnwindSafe(func)) {
      Ok(value) => {
        trace!(%task_id, "Task executed successfully.");
        Ok(value)
      }
      Err(payload) => {
        let err = PoolError::from_panic(&*payload);
        error!(%task_id, "Task panicked during execution: {}", err);
        Err(err)
      }
    };
    let status = TaskCompletionStatus::from(&outcome);

    if result_sender.send(outcome).is_err() {
      warn!(%task_id, "Result receiver for task was dropped. Task outcome was discarded.");
    }
    status
  }
}

/// A type-erased task as stored in the queue.
pub(crate) struct Job {
  pub(crate) task_id: u64,
  runnable: Box<dyn Runnable>,
}

impl Job {
  pub(crate) fn new<F, R>(task_id: u64, func: F, result_sender: oneshot::Sender<TaskOutcome<R>>) -> Self
  where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
  {
    Self {
      task_id,
      runnable: Box::new(ManagedTask {
        task_id,
        func,
        result_sender,
      }),
    }
  }

  /// Consumes the job, running it on the current thread.
  pub(crate) fn run(self) -> TaskCompletionStatus {
    self.runnable.run()
  }
}

impl fmt::Debug for Job {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Job").field("task_id", &self.task_id).finish_non_exhaustive()
  }
}
