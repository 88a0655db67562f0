use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thread_orchestra::{PoolConfig, ShutdownMode, TaskCompletionInfo, TaskCompletionStatus, TaskHandle, WorkerPool};
use tracing::info;

// Dummy task function
fn my_notified_task(id: usize, delay_ms: u64, should_panic: bool) -> String {
  info!(
    "NotifiedTask {}: Starting, will sleep for {}ms. Panic: {}",
    id, delay_ms, should_panic
  );
  thread::sleep(Duration::from_millis(delay_ms));
  if should_panic {
    info!("NotifiedTask {}: Panicking as requested!", id);
    panic!("NotifiedTask {} panicked!", id);
  }
  let result = format!("NotifiedTask {} finished successfully after {}ms", id, delay_ms);
  info!("{}", result);
  result
}

fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::INFO)
    .with_target(false)
    .init();

  info!("--- Completion Notifier Example ---");

  let config = PoolConfig::new(2, "notifier_example_pool").with_thread_name_prefix("notifier-worker");
  let pool = WorkerPool::with_config(config).expect("Failed to start pool");

  // --- Setup Completion Handlers ---
  let successful_tasks_count = Arc::new(AtomicUsize::new(0));
  let failed_tasks_count = Arc::new(AtomicUsize::new(0)); // Panicked or abandoned

  // Handler 1: Simple logger
  pool.add_completion_handler({
    let pool_name_clone = pool.name().to_string();
    move |info: TaskCompletionInfo| {
      assert_eq!(*info.pool_name, pool_name_clone);
      info!(
        "[Handler 1 - Logger] Task {} (Pool: {}, Worker: {:?}) completed. Status: {:?}, Time: {:?}",
        info.task_id, info.pool_name, info.worker_id, info.status, info.completion_time
      );
    }
  });

  // Handler 2: Counter
  let s_clone = successful_tasks_count.clone();
  let f_clone = failed_tasks_count.clone();
  pool.add_completion_handler(move |info: TaskCompletionInfo| match info.status {
    TaskCompletionStatus::Success => {
      s_clone.fetch_add(1, Ordering::Relaxed);
      info!("[Handler 2 - Counter] Task {} succeeded.", info.task_id);
    }
    _ => {
      f_clone.fetch_add(1, Ordering::Relaxed);
      info!(
        "[Handler 2 - Counter] Task {} did not succeed (Status: {:?}).",
        info.task_id, info.status
      );
    }
  });

  // --- Submit Tasks ---
  let plan = [(1, 300, false), (2, 100, true), (3, 200, false), (4, 600, false)];
  let handles: Vec<TaskHandle<String>> = plan
    .iter()
    .filter_map(|&(id, delay_ms, should_panic)| pool.submit(move || my_notified_task(id, delay_ms, should_panic)).ok())
    .collect();

  info!("All tasks submitted. One of them will panic.");
  for handle in handles {
    let task_id = handle.id();
    match handle.wait() {
      Ok(result) => info!("Main: Result for task {}: {}", task_id, result),
      Err(e) => info!("Main: Error for task {}: {:?}", task_id, e),
    }
  }

  // --- Shutdown and Summary ---
  info!("All task handles observed. Shutting down pool...");
  pool.shutdown(ShutdownMode::Drain); // Joining the workers lets every notification finish
  info!("Pool shutdown complete.");

  info!("--- Summary from Completion Notifier ---");
  info!(
    "Successful tasks (counted by handler): {}",
    successful_tasks_count.load(Ordering::Relaxed)
  );
  info!(
    "Non-successful tasks (counted by handler): {}",
    failed_tasks_count.load(Ordering::Relaxed)
  );
  info!("--- Completion Notifier Example End ---");
}
