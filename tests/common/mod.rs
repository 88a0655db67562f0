#![allow(dead_code)]

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};

use thread_orchestra::{TaskHandle, WorkerPool};

// Helper to initialize tracing for tests (call once per test run, not per test function)
pub fn setup_tracing_for_test() {
  use std::sync::Once;
  use tracing_subscriber::{fmt, EnvFilter};
  static TRACING_INIT: Once = Once::new();

  TRACING_INIT.call_once(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,thread_orchestra=trace"));

    fmt::Subscriber::builder()
      .with_env_filter(filter)
      .with_test_writer()
      .try_init()
      .ok();
  });
}

/// A one-way latch: tasks block in `wait` until the test calls `open`.
#[derive(Clone, Default)]
pub struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn wait(&self) {
    let (lock, cvar) = &*self.0;
    let mut open = lock.lock().unwrap();
    while !*open {
      open = cvar.wait(open).unwrap();
    }
  }

  pub fn open(&self) {
    let (lock, cvar) = &*self.0;
    *lock.lock().unwrap() = true;
    cvar.notify_all();
  }
}

/// Occupies `count` workers with tasks parked on `gate`, returning once all of them are running.
pub fn block_workers(pool: &WorkerPool, gate: &Gate, count: usize) -> Vec<TaskHandle<()>> {
  let (started_tx, started_rx) = mpsc::channel();
  let handles = (0..count)
    .map(|_| {
      let gate = gate.clone();
      let started_tx = started_tx.clone();
      pool
        .submit(move || {
          started_tx.send(()).unwrap();
          gate.wait();
        })
        .unwrap()
    })
    .collect();
  for _ in 0..count {
    started_rx.recv().unwrap();
  }
  handles
}
