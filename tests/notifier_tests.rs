mod common;

use common::{block_workers, setup_tracing_for_test, Gate};

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime};

use thread_orchestra::{ShutdownMode, TaskCompletionInfo, TaskCompletionStatus, WorkerPool};

fn recording_handler(pool: &WorkerPool) -> Arc<Mutex<Vec<TaskCompletionInfo>>> {
  let received = Arc::new(Mutex::new(Vec::new()));
  let received_clone = received.clone();
  pool.add_completion_handler(move |info| received_clone.lock().unwrap().push(info));
  received
}

#[test]
fn test_notifier_reports_success_and_panic() {
  setup_tracing_for_test();
  let pool_name = "test_notifier_success_and_panic";
  let pool = WorkerPool::new(2, pool_name).unwrap();
  let received = recording_handler(&pool);
  let before = SystemTime::now();

  let ok_handle = pool.submit(|| "fine").unwrap();
  let panic_handle = pool.submit(|| -> u8 { panic!("notifier test panic") }).unwrap();
  let ok_id = ok_handle.id();
  let panic_id = panic_handle.id();
  ok_handle.wait().unwrap();
  panic_handle.wait().unwrap_err();

  // Handlers run after the result is delivered; joining the workers orders them before us.
  pool.shutdown(ShutdownMode::Drain);

  let received = received.lock().unwrap();
  assert_eq!(received.len(), 2);
  let by_id: HashMap<u64, &TaskCompletionInfo> = received.iter().map(|info| (info.task_id, info)).collect();

  let ok_info = by_id[&ok_id];
  assert_eq!(ok_info.status, TaskCompletionStatus::Success);
  assert_eq!(*ok_info.pool_name, pool_name);
  assert!(ok_info.worker_id.is_some_and(|id| id < pool.size()));
  assert!(ok_info.completion_time >= before);

  let panic_info = by_id[&panic_id];
  assert_eq!(panic_info.status, TaskCompletionStatus::Panicked);
  assert!(panic_info.worker_id.is_some());
}

#[test]
fn test_notifier_sees_every_task_exactly_once() {
  setup_tracing_for_test();
  let pool = WorkerPool::new(4, "test_notifier_exactly_once").unwrap();
  let counts: Arc<Mutex<HashMap<u64, usize>>> = Arc::new(Mutex::new(HashMap::new()));
  {
    let counts = counts.clone();
    pool.add_completion_handler(move |info| {
      *counts.lock().unwrap().entry(info.task_id).or_insert(0) += 1;
    });
  }

  let ids: Vec<u64> = (0..100).map(|i| pool.submit(move || i + 1).unwrap().id()).collect();
  pool.shutdown(ShutdownMode::Drain);

  let counts = counts.lock().unwrap();
  assert_eq!(counts.len(), ids.len());
  for id in ids {
    assert_eq!(counts.get(&id), Some(&1), "task {} should be reported once", id);
  }
}

#[test]
fn test_notifier_reports_abandoned_tasks() {
  setup_tracing_for_test();
  let pool = Arc::new(WorkerPool::new(2, "test_notifier_abandoned").unwrap());
  let received = recording_handler(&pool);
  let gate = Gate::new();
  let _blockers = block_workers(&pool, &gate, 2);

  let abandoned_ids: Vec<u64> = (0..3).map(|_| pool.submit(|| ()).unwrap().id()).collect();

  let shutdown_thread = {
    let pool = pool.clone();
    thread::spawn(move || pool.shutdown(ShutdownMode::Abandon))
  };
  while pool.queued_task_count() > 0 {
    thread::sleep(Duration::from_millis(5));
  }
  gate.open();
  shutdown_thread.join().unwrap();

  let received = received.lock().unwrap();
  let abandoned: Vec<&TaskCompletionInfo> = received
    .iter()
    .filter(|info| info.status == TaskCompletionStatus::Abandoned)
    .collect();
  assert_eq!(abandoned.len(), 3);
  for info in &abandoned {
    assert!(abandoned_ids.contains(&info.task_id));
    assert_eq!(info.worker_id, None);
  }
  let succeeded = received
    .iter()
    .filter(|info| info.status == TaskCompletionStatus::Success)
    .count();
  assert_eq!(succeeded, 2, "the two gate tasks still complete");
}

#[test]
fn test_panicking_handler_does_not_affect_pool_or_other_handlers() {
  setup_tracing_for_test();
  let pool = WorkerPool::new(2, "test_notifier_handler_panic").unwrap();
  let calls = Arc::new(AtomicUsize::new(0));

  pool.add_completion_handler(|info| panic!("handler failed for task {}", info.task_id));
  {
    let calls = calls.clone();
    pool.add_completion_handler(move |_| {
      calls.fetch_add(1, Ordering::SeqCst);
    });
  }

  let handles: Vec<_> = (0..10).map(|i| pool.submit(move || i * 2).unwrap()).collect();
  let results: Vec<i32> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
  assert_eq!(results, (0..10).map(|i| i * 2).collect::<Vec<_>>());

  pool.shutdown(ShutdownMode::Drain);
  assert_eq!(calls.load(Ordering::SeqCst), 10);
}

#[test]
fn test_handler_added_later_only_sees_later_tasks() {
  setup_tracing_for_test();
  let pool = WorkerPool::new(2, "test_notifier_late_handler").unwrap();

  let early = pool.submit(|| 1).unwrap();
  let early_id = early.id();
  early.wait().unwrap();
  // Let the worker finish dispatching the (empty) notification for the early task.
  while pool.active_task_count() > 0 {
    thread::sleep(Duration::from_millis(1));
  }

  let received = recording_handler(&pool);
  let late = pool.submit(|| 2).unwrap();
  let late_id = late.id();
  late.wait().unwrap();
  pool.shutdown(ShutdownMode::Drain);

  let ids: Vec<u64> = received.lock().unwrap().iter().map(|info| info.task_id).collect();
  assert_eq!(ids, vec![late_id]);
  assert!(!ids.contains(&early_id));
}
