//! Compares a single-threaded quicksort with one that hands partitions to the
//! pool, and with the standard library sort.
//!
//! The pooled variant only splits work on the calling thread and never blocks a
//! worker on another task of the same pool, so it cannot stall no matter how
//! small the pool is.

use std::time::Instant;

use rand::Rng;
use thread_orchestra::{ShutdownMode, TaskHandle, WorkerPool};
use tracing::info;

const LIST_LEN: usize = 200_000;
const PARTITIONS: usize = 16;

fn single_thread_quick_sort(mut input: Vec<i32>) -> Vec<i32> {
  if input.len() <= 1 {
    return input;
  }
  let pivot = input.swap_remove(0);
  let (lower, higher): (Vec<i32>, Vec<i32>) = input.into_iter().partition(|v| *v < pivot);
  let mut result = single_thread_quick_sort(lower);
  result.push(pivot);
  result.extend(single_thread_quick_sort(higher));
  result
}

/// Splits `input` into value ranges around sampled pivots, sorts each range on
/// the pool and concatenates the results in order.
fn pool_quick_sort(pool: &WorkerPool, input: Vec<i32>) -> Vec<i32> {
  if input.len() <= PARTITIONS {
    return single_thread_quick_sort(input);
  }
  let mut pivots: Vec<i32> = (1..PARTITIONS).map(|i| input[i * input.len() / PARTITIONS]).collect();
  pivots.sort_unstable();

  let mut buckets: Vec<Vec<i32>> = vec![Vec::new(); PARTITIONS];
  for value in input {
    let bucket = pivots.partition_point(|p| *p <= value);
    buckets[bucket].push(value);
  }

  let handles: Vec<TaskHandle<Vec<i32>>> = buckets
    .into_iter()
    .map(|bucket| pool.submit(move || single_thread_quick_sort(bucket)).expect("pool is running"))
    .collect();
  handles
    .into_iter()
    .flat_map(|h| h.wait().expect("sort task failed"))
    .collect()
}

fn random_list(len: usize) -> Vec<i32> {
  let mut rng = rand::rng();
  (0..len).map(|_| rng.random::<i32>()).collect()
}

fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::INFO)
    .with_target(false)
    .init();

  let list = random_list(LIST_LEN);
  let pool = WorkerPool::new(num_cpus::get(), "sort_pool").expect("Failed to start pool");
  info!("Start sort of {} numbers on {} workers", list.len(), pool.size());

  let start = Instant::now();
  let pooled = pool_quick_sort(&pool, list.clone());
  info!("Using WorkerPool sort spent {:?}", start.elapsed());

  let start = Instant::now();
  let single = single_thread_quick_sort(list.clone());
  info!("Single thread sort spent {:?}", start.elapsed());

  let mut std_sorted = list;
  let start = Instant::now();
  std_sorted.sort_unstable();
  info!("std sort_unstable spent {:?}", start.elapsed());

  assert_eq!(pooled, std_sorted);
  assert_eq!(single, std_sorted);
  pool.shutdown(ShutdownMode::Drain);
}
