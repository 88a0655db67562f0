use crate::manager::ShutdownMode;
use crate::task::Job;

use std::collections::VecDeque;
use std::fmt;

use parking_lot::{Condvar, Mutex};

/// What a worker receives from [`TaskQueue::pop_blocking`].
#[derive(Debug)]
pub(crate) enum Popped {
  Job(Job),
  Shutdown,
}

struct QueueState {
  jobs: VecDeque<Job>,
  closed: bool,
}

/// An unbounded, multi-producer, multi-consumer FIFO of jobs.
///
/// All mutation happens under one mutex. Idle workers park on the condition
/// variable until a job arrives or the queue is closed.
pub(crate) struct TaskQueue {
  state: Mutex<QueueState>,
  available: Condvar,
}

impl fmt::Debug for TaskQueue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("TaskQueue")
      .field("len", &state.jobs.len())
      .field("closed", &state.closed)
      .finish()
  }
}

impl TaskQueue {
  pub(crate) fn new() -> Self {
    Self {
      state: Mutex::new(QueueState {
        jobs: VecDeque::new(),
        closed: false,
      }),
      available: Condvar::new(),
    }
  }

  /// Appends a job and wakes one waiting worker.
  ///
  /// Hands the job back if the queue has been closed.
  pub(crate) fn push(&self, job: Job) -> Result<(), Job> {
    {
      let mut state = self.state.lock();
      if state.closed {
        return Err(job);
      }
      state.jobs.push_back(job);
    }
    self.available.notify_one();
    Ok(())
  }

  /// Blocks until a job is available or the queue is closed and empty.
  pub(crate) fn pop_blocking(&self) -> Popped {
    let mut state = self.state.lock();
    loop {
      if let Some(job) = state.jobs.pop_front() {
        return Popped::Job(job);
      }
      if state.closed {
        return Popped::Shutdown;
      }
      self.available.wait(&mut state);
    }
  }

  /// Stops admission and wakes every waiting worker.
  ///
  /// With `Drain` the queued jobs stay for workers to finish; with `Abandon`
  /// they are removed and returned to the caller. A second close returns nothing.
  pub(crate) fn close(&self, mode: ShutdownMode) -> Vec<Job> {
    let abandoned = {
      let mut state = self.state.lock();
      if state.closed {
        return Vec::new();
      }
      state.closed = true;
      match mode {
        ShutdownMode::Drain => Vec::new(),
        ShutdownMode::Abandon => state.jobs.drain(..).collect(),
      }
    };
    self.available.notify_all();
    abandoned
  }

  pub(crate) fn len(&self) -> usize {
    self.state.lock().jobs.len()
  }

  pub(crate) fn is_closed(&self) -> bool {
    self.state.lock().closed
  }
}
