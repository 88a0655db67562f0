use crate::manager::ShutdownMode;

/// Pools never run with fewer workers than this.
pub const MIN_WORKERS: usize = 2;

/// Construction-time settings for a `WorkerPool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
  /// Requested number of worker threads, raised to `MIN_WORKERS` if lower.
  pub size: usize,
  /// Name used in logs and completion notifications.
  pub name: String,
  /// Worker threads are named `{thread_name_prefix}-{worker_id}`.
  pub thread_name_prefix: String,
  /// Stack size for worker threads; the platform default when `None`.
  pub stack_size: Option<usize>,
  /// Shutdown policy applied when the pool is dropped without an explicit shutdown.
  pub drop_mode: ShutdownMode,
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self {
      size: num_cpus::get(),
      name: "worker_pool".to_string(),
      thread_name_prefix: "pool-worker".to_string(),
      stack_size: None,
      drop_mode: ShutdownMode::Drain,
    }
  }
}

impl PoolConfig {
  pub fn new(size: usize, name: &str) -> Self {
    Self {
      size,
      name: name.to_string(),
      ..Default::default()
    }
  }

  pub fn with_thread_name_prefix(mut self, prefix: &str) -> Self {
    self.thread_name_prefix = prefix.to_string();
    self
  }

  pub fn with_stack_size(mut self, stack_size: usize) -> Self {
    self.stack_size = Some(stack_size);
    self
  }

  pub fn with_drop_mode(mut self, mode: ShutdownMode) -> Self {
    self.drop_mode = mode;
    self
  }

  /// The number of workers actually spawned for this configuration.
  pub fn effective_size(&self) -> usize {
    self.size.max(MIN_WORKERS)
  }
}
