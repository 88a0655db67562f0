use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thread_orchestra::{ShutdownMode, TaskHandle, WorkerPool};
use tracing::info;

fn work_task_fn(id: usize, duration_ms: u64) -> String {
  info!("Task {} starting (will run for {}ms)", id, duration_ms);
  thread::sleep(Duration::from_millis(duration_ms));
  let result = format!("Task {} finished after {}ms", id, duration_ms);
  info!("{}", result);
  result
}

fn run_with_mode(mode: ShutdownMode) {
  info!("=== Shutdown with {:?} ===", mode);
  let pool = Arc::new(WorkerPool::new(2, &format!("{:?}_pool", mode).to_lowercase()).expect("Failed to start pool"));

  // Tasks 0 and 1 start right away, tasks 2..5 wait in the queue.
  let handles: Vec<TaskHandle<String>> = (0..5)
    .map(|i| pool.submit(move || work_task_fn(i, 500)).expect("Failed to submit task"))
    .collect();

  thread::sleep(Duration::from_millis(100)); // Let the first two tasks start
  info!(
    "Queue size: {}, Active: {}. Initiating shutdown...",
    pool.queued_task_count(),
    pool.active_task_count()
  );

  let shutdown_jh = {
    let pool = pool.clone();
    thread::spawn(move || {
      pool.shutdown(mode);
      info!("Pool shutdown call completed.");
    })
  };

  thread::sleep(Duration::from_millis(50)); // Ensure shutdown has begun
  match pool.submit(|| work_task_fn(99, 100)) {
    Ok(_) => tracing::error!("LATE SUBMISSION SUCCEEDED (UNEXPECTED!)"),
    Err(e) => info!("Late submission correctly failed: {}", e),
  }

  for handle in handles {
    let task_id = handle.id();
    match handle.wait() {
      Ok(result) => info!("Task {} result: {}", task_id, result),
      Err(e) => info!("Task {} error: {}", task_id, e),
    }
  }

  shutdown_jh.join().expect("Shutdown thread panicked");
  info!("Pool state after shutdown: {:?}", pool.state());
}

fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();
  info!("--- Shutdown Modes Example ---");

  // Drain: every queued task still runs before the workers exit.
  run_with_mode(ShutdownMode::Drain);
  // Abandon: queued tasks are dropped and their handles report TaskAbandoned.
  run_with_mode(ShutdownMode::Abandon);

  info!("--- Shutdown Modes Example End ---");
}
