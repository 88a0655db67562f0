use std::thread;
use std::time::Duration;
use thread_orchestra::{ShutdownMode, TaskHandle, WorkerPool};
use tracing::info;

fn my_task_fn(id: usize, delay_ms: u64) -> String {
  info!("Task {} starting, will sleep for {}ms", id, delay_ms);
  thread::sleep(Duration::from_millis(delay_ms));
  let result = format!("Task {} finished successfully after {}ms", id, delay_ms);
  info!("{}", result);
  result
}

fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false) // Disable module paths for cleaner example output
    .init();

  info!("--- Basic Usage Example ---");

  let pool = WorkerPool::new(2, "basic_pool").expect("Failed to start pool");

  let mut handles: Vec<TaskHandle<String>> = Vec::new();

  for i in 0..5 {
    // Alternate sleep times for variety
    let sleep_duration: u64 = 500 + (i as u64 % 3 * 250);
    match pool.submit(move || my_task_fn(i, sleep_duration)) {
      Ok(handle) => {
        info!("Submitted task {} with handle id {}", i, handle.id());
        handles.push(handle);
      }
      Err(e) => {
        tracing::error!("Failed to submit task {}: {:?}", i, e);
      }
    }
  }

  info!(
    "All tasks submitted. Queue size: {}, Active: {}. Waiting for results...",
    pool.queued_task_count(),
    pool.active_task_count()
  );

  for handle in handles {
    let task_id = handle.id();
    match handle.wait() {
      Ok(result) => info!("Result for task {}: {}", task_id, result),
      Err(e) => info!("Error for task {}: {:?}", task_id, e),
    }
  }

  info!("All task results processed. Shutting down pool.");
  pool.shutdown(ShutdownMode::Drain);
  info!("Pool shutdown complete.");
  info!("--- Basic Usage Example End ---");
}
