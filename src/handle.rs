use crate::error::PoolError;
use crate::task::TaskOutcome;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::executor;

/// A handle to a task submitted to a `WorkerPool`.
///
/// The task's return value, or the failure it produced, is observed through
/// the handle. It can be blocked on with [`wait`](TaskHandle::wait), polled
/// with [`try_result`](TaskHandle::try_result), or awaited from any executor.
/// There is no built-in timeout: race the handle against a timer if needed.
#[derive(Debug)]
pub struct TaskHandle<R: Send + 'static> {
  pub(crate) task_id: u64,
  pub(crate) result_receiver: Option<oneshot::Receiver<TaskOutcome<R>>>,
}

impl<R: Send + 'static> TaskHandle<R> {
  pub(crate) fn new(task_id: u64, result_receiver: oneshot::Receiver<TaskOutcome<R>>) -> Self {
    Self {
      task_id,
      result_receiver: Some(result_receiver),
    }
  }

  /// Returns the unique ID of this task.
  pub fn id(&self) -> u64 {
    self.task_id
  }

  /// Blocks the current thread until the task has finished and returns its result.
  ///
  /// # Errors
  /// Returns `PoolError::TaskPanicked` if the task panicked during execution.
  /// Returns `PoolError::TaskAbandoned` if the pool shut down before the task ran.
  /// Returns `PoolError::ResultUnavailable` if the outcome was already taken.
  pub fn wait(mut self) -> Result<R, PoolError> {
    match self.result_receiver.take() {
      Some(rx) => Self::map_received(self.task_id, executor::block_on(rx)),
      None => Err(PoolError::ResultUnavailable),
    }
  }

  /// Awaits the completion of the task and returns its result of type `R`.
  ///
  /// Same outcomes as [`wait`](TaskHandle::wait), without blocking the executor thread.
  pub async fn await_result(self) -> Result<R, PoolError> {
    self.await
  }

  /// Checks for the outcome without blocking.
  ///
  /// Returns `None` while the task is still queued or running. The first
  /// `Some` carries the outcome; later calls return
  /// `Some(Err(PoolError::ResultUnavailable))`.
  pub fn try_result(&mut self) -> Option<Result<R, PoolError>> {
    let rx = match self.result_receiver.as_mut() {
      Some(rx) => rx,
      None => return Some(Err(PoolError::ResultUnavailable)),
    };
    let received = match rx.try_recv() {
      Ok(None) => return None,
      Ok(Some(outcome)) => Ok(outcome),
      Err(canceled) => Err(canceled),
    };
    self.result_receiver = None;
    Some(Self::map_received(self.task_id, received))
  }

  fn map_received(task_id: u64, received: Result<TaskOutcome<R>, oneshot::Canceled>) -> Result<R, PoolError> {
    match received {
      Ok(outcome) => outcome,
      Err(oneshot::Canceled) => {
        // The sender was dropped without a value: the job never ran.
        tracing::warn!(%task_id, "Result channel closed before the task ran; task was abandoned.");
        Err(PoolError::TaskAbandoned)
      }
    }
  }
}

impl<R: Send + 'static> Future for TaskHandle<R> {
  type Output = Result<R, PoolError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    let task_id = this.task_id;
    let rx = match this.result_receiver.as_mut() {
      Some(rx) => rx,
      None => return Poll::Ready(Err(PoolError::ResultUnavailable)),
    };
    match Pin::new(rx).poll(cx) {
      Poll::Ready(received) => {
        this.result_receiver = None;
        Poll::Ready(Self::map_received(task_id, received))
      }
      Poll::Pending => Poll::Pending,
    }
  }
}
