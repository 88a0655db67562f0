use thiserror::Error;

/// Errors that can occur within the `thread_orchestra` pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
  #[error("Pool is shutting down or already shut down, cannot accept new tasks")]
  PoolClosed,

  #[error("Submitted task panicked: {0}")]
  TaskPanicked(String),

  #[error("Task was abandoned in the queue when the pool shut down")]
  TaskAbandoned,

  #[error("Task result already taken from this handle")]
  ResultUnavailable,

  #[error("Failed to spawn pool worker thread: {0}")]
  WorkerSpawn(String),
}

impl PoolError {
  /// Builds a `TaskPanicked` error from a panic payload caught with `catch_unwind`.
  pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
      (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.clone()
    } else {
      "<non-string panic payload>".to_string()
    };
    PoolError::TaskPanicked(message)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::panic;

  #[test]
  fn panic_payload_messages_are_preserved() {
    let str_payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();
    assert_eq!(
      PoolError::from_panic(&*str_payload),
      PoolError::TaskPanicked("static message".to_string())
    );

    let owned_payload = panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
    assert_eq!(
      PoolError::from_panic(&*owned_payload),
      PoolError::TaskPanicked("formatted 42".to_string())
    );

    let other_payload = panic::catch_unwind(|| panic::panic_any(7u32)).unwrap_err();
    assert_eq!(
      PoolError::from_panic(&*other_payload),
      PoolError::TaskPanicked("<non-string panic payload>".to_string())
    );
  }

  #[test]
  fn display_messages() {
    assert_eq!(
      PoolError::PoolClosed.to_string(),
      "Pool is shutting down or already shut down, cannot accept new tasks"
    );
    assert_eq!(PoolError::TaskPanicked("boom".into()).to_string(), "Submitted task panicked: boom");
  }
}
