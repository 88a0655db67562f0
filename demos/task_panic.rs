use std::thread;
use std::time::Duration;
use thread_orchestra::{PoolError, ShutdownMode, WorkerPool};
use tracing::info;

fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();
  info!("--- Task Panic Example ---");

  let pool = WorkerPool::new(2, "panic_pool").expect("Failed to start pool");

  let handle = pool
    .submit(|| -> String {
      info!("Panicking Task: Starting...");
      thread::sleep(Duration::from_millis(100));
      info!("Panicking Task: About to panic!");
      panic!("This task is designed to panic!");
    })
    .expect("Failed to submit panicking task");

  let task_id = handle.id(); // Get the ID before handle is consumed
  info!("Panicking task {} submitted. Waiting for result...", task_id);

  match handle.wait() {
    Ok(result) => info!("Task {} completed with UNEXPECTED result: {}", task_id, result),
    Err(PoolError::TaskPanicked(message)) => {
      info!("Task {} correctly resulted in PoolError::TaskPanicked: {}", task_id, message);
    }
    Err(e) => info!("Task {} resulted in unexpected error: {:?}", task_id, e),
  }

  // The worker that ran the panicking task keeps serving the queue.
  let follow_up = pool.submit(|| 2 + 2).expect("Failed to submit follow-up task");
  info!("Follow-up task result: {:?}", follow_up.wait());

  info!("Shutting down pool.");
  pool.shutdown(ShutdownMode::Drain);
  info!("Pool shutdown complete.");
  info!("--- Task Panic Example End ---");
}
