use crate::error::PoolError;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::{debug, error, info, trace};

// --- Public Event Structs for Handlers ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCompletionStatus {
  Success,
  Panicked,
  Abandoned,
}

impl<R> From<&Result<R, PoolError>> for TaskCompletionStatus {
  fn from(result: &Result<R, PoolError>) -> Self {
    match result {
      Ok(_) => TaskCompletionStatus::Success,
      Err(PoolError::TaskAbandoned) => TaskCompletionStatus::Abandoned,
      Err(_) => TaskCompletionStatus::Panicked,
    }
  }
}

/// Passed to every completion handler once a task has finished or been abandoned.
#[derive(Debug, Clone)]
pub struct TaskCompletionInfo {
  pub task_id: u64,
  pub pool_name: Arc<String>,
  /// The worker that ran the task, `None` for abandoned tasks.
  pub worker_id: Option<usize>,
  pub status: TaskCompletionStatus,
  pub completion_time: SystemTime,
}

type CompletionHandler = Arc<dyn Fn(TaskCompletionInfo) + Send + Sync + 'static>;

/// Fans task completions out to user-registered handlers.
///
/// Handlers run synchronously on the thread reporting the completion (the
/// executing worker, or the thread performing an abandoning shutdown).
pub(crate) struct CompletionNotifier {
  pool_name: Arc<String>,
  handlers: RwLock<Vec<CompletionHandler>>,
}

impl fmt::Debug for CompletionNotifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let handler_count = self.handlers.try_read().map_or(0, |guard| guard.len());
    f.debug_struct("CompletionNotifier")
      .field("pool_name", &self.pool_name)
      .field("handler_count", &handler_count)
      .finish()
  }
}

impl CompletionNotifier {
  pub(crate) fn new(pool_name: Arc<String>) -> Self {
    Self {
      pool_name,
      handlers: RwLock::new(Vec::new()),
    }
  }

  pub(crate) fn add_handler(&self, handler: impl Fn(TaskCompletionInfo) + Send + Sync + 'static) {
    let mut handlers_guard = self.handlers.write();
    handlers_guard.push(Arc::new(handler));
    info!(pool_name = %*self.pool_name, "Notifier: Added new completion handler. Total handlers: {}", handlers_guard.len());
  }

  pub(crate) fn notify(&self, task_id: u64, worker_id: Option<usize>, status: TaskCompletionStatus) {
    // Clone the list so a handler may register further handlers without deadlocking.
    let handlers: Vec<CompletionHandler> = self.handlers.read().clone();
    if handlers.is_empty() {
      trace!(%task_id, "No completion handlers registered, dropping notification.");
      return;
    }

    let info = TaskCompletionInfo {
      task_id,
      pool_name: self.pool_name.clone(),
      worker_id,
      status,
      completion_time: SystemTime::now(),
    };
    debug!(%task_id, ?status, "Dispatching notification to {} handlers.", handlers.len());

    for handler in handlers {
      let info_for_handler = info.clone();
      if panic::catch_unwind(AssertUnwindSafe(|| handler(info_for_handler))).is_err() {
        error!(
          "A completion handler panicked during execution. Pool: {}, Task ID: {}",
          self.pool_name, task_id
        );
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn status_from_outcome() {
    assert_eq!(TaskCompletionStatus::from(&Ok::<u8, PoolError>(1)), TaskCompletionStatus::Success);
    assert_eq!(
      TaskCompletionStatus::from(&Err::<u8, _>(PoolError::TaskPanicked("x".into()))),
      TaskCompletionStatus::Panicked
    );
    assert_eq!(
      TaskCompletionStatus::from(&Err::<u8, _>(PoolError::TaskAbandoned)),
      TaskCompletionStatus::Abandoned
    );
  }

  #[test]
  fn panicking_handler_does_not_stop_others() {
    let notifier = CompletionNotifier::new(Arc::new("unit".to_string()));
    let calls = Arc::new(AtomicUsize::new(0));

    notifier.add_handler(|_| panic!("handler failure"));
    let calls_clone = calls.clone();
    notifier.add_handler(move |info| {
      assert_eq!(info.task_id, 9);
      assert_eq!(info.worker_id, Some(1));
      calls_clone.fetch_add(1, Ordering::SeqCst);
    });

    notifier.notify(9, Some(1), TaskCompletionStatus::Success);
    notifier.notify(9, Some(1), TaskCompletionStatus::Success);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
