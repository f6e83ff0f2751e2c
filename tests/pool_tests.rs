use futures_convoy::{PoolConfig, PoolController, PoolError, TaskResult};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

// Helper to initialize tracing for tests (call once per test run, not per
// test function). Once ensures it runs a single time.
fn setup_tracing_for_test() {
  use std::sync::Once;
  use tracing_subscriber::{fmt, EnvFilter};
  static TRACING_INIT: Once = Once::new();

  TRACING_INIT.call_once(|| {
    let filter =
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,futures_convoy=trace"));

    fmt::Subscriber::builder()
      .with_env_filter(filter)
      .with_test_writer()
      .try_init()
      .ok();
  });
}

#[tokio::test]
async fn test_collects_all_results_within_concurrency_ceiling() {
  setup_tracing_for_test();
  let current = Arc::new(AtomicUsize::new(0));
  let max_seen = Arc::new(AtomicUsize::new(0));

  let mut config = PoolConfig::new(vec![1u32, 2, 3, 4, 5], {
    let current = current.clone();
    let max_seen = max_seen.clone();
    move |item, _index, _pool| {
      let current = current.clone();
      let max_seen = max_seen.clone();
      async move {
        let in_flight = current.fetch_add(1, Ordering::SeqCst) + 1;
        max_seen.fetch_max(in_flight, Ordering::SeqCst);
        sleep(Duration::from_millis(20)).await;
        current.fetch_sub(1, Ordering::SeqCst);
        Ok::<_, PoolError>(item * 2)
      }
    }
  });
  config.concurrency = 2;

  let output = config.run().await.unwrap();

  assert!(output.errors.is_empty());
  // Completion order is unconstrained with more than one slot.
  let mut results = output.results.into_collected().unwrap();
  results.sort_unstable();
  assert_eq!(results, vec![2, 4, 6, 8, 10]);
  assert!(
    max_seen.load(Ordering::SeqCst) <= 2,
    "active tasks exceeded the ceiling: {}",
    max_seen.load(Ordering::SeqCst)
  );
}

#[tokio::test]
async fn test_single_slot_results_follow_source_order() {
  setup_tracing_for_test();
  let mut config = PoolConfig::new(vec![1u32, 2, 3, 4, 5], |item, _index, _pool| async move {
    Ok::<_, PoolError>(item * 2)
  });
  config.concurrency = 1;

  let output = config.run().await.unwrap();

  assert_eq!(output.results.into_collected().unwrap(), vec![2, 4, 6, 8, 10]);
  assert!(output.errors.is_empty());
  assert_eq!(output.processed_items, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_corresponding_results_mark_failed_slots() {
  setup_tracing_for_test();
  let mut config = PoolConfig::new(vec![1u32, 2, 3, 4, 5], |item, _index, _pool| async move {
    if item == 3 {
      return Err(PoolError::failed("cannot double 3"));
    }
    Ok(item * 2)
  });
  config.concurrency = 2;
  config.corresponding_results = true;

  let output = config.run().await.unwrap();

  let slots = output.results.into_corresponding().unwrap();
  assert_eq!(
    slots,
    vec![
      TaskResult::Value(2),
      TaskResult::Value(4),
      TaskResult::Failed,
      TaskResult::Value(8),
      TaskResult::Value(10),
    ]
  );
  assert_eq!(output.errors.len(), 1);
  assert_eq!(output.errors[0].item, 3);
  assert_eq!(output.errors[0].message(), "cannot double 3");
}

#[tokio::test]
async fn test_stop_halts_dispatch_and_keeps_prior_results() {
  setup_tracing_for_test();
  let mut config = PoolConfig::new(vec![1u32, 2, 3, 4, 5], |item, _index, pool| async move {
    if item == 3 {
      return Err(pool.stop());
    }
    Ok(item * 2)
  });
  config.concurrency = 1;

  let output = config.run().await.unwrap();

  // The stopping task contributes neither a result nor an error, but it
  // did settle and therefore counts as processed.
  assert_eq!(output.results.into_collected().unwrap(), vec![2, 4]);
  assert!(output.errors.is_empty());
  assert_eq!(output.processed_items, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_stop_leaves_unreached_slots_not_run() {
  setup_tracing_for_test();
  let mut config = PoolConfig::new(vec![1u32, 2, 3, 4, 5], |item, _index, pool| async move {
    if item == 3 {
      return Err(pool.stop());
    }
    Ok(item * 2)
  });
  config.concurrency = 1;
  config.corresponding_results = true;

  let output = config.run().await.unwrap();

  let slots = output.results.into_corresponding().unwrap();
  assert_eq!(
    slots,
    vec![
      TaskResult::Value(2),
      TaskResult::Value(4),
      TaskResult::NotRun,
      TaskResult::NotRun,
      TaskResult::NotRun,
    ]
  );
  assert!(output.errors.is_empty());
}

#[tokio::test]
async fn test_timeout_settles_as_tagged_error() {
  setup_tracing_for_test();
  let mut config = PoolConfig::new(vec!["slow"], |_item, _index, _pool| async move {
    sleep(Duration::from_millis(100)).await;
    Ok::<_, PoolError>("done")
  });
  config.timeout = Some(Duration::from_millis(10));

  let output = config.run().await.unwrap();

  assert_eq!(output.results.len(), 0);
  assert_eq!(output.errors.len(), 1);
  assert_eq!(output.errors[0].item, "slow");
  assert_eq!(
    output.errors[0].error,
    PoolError::Timeout(Duration::from_millis(10))
  );
  assert_eq!(
    output.errors[0].message(),
    "task in pool timed out after 10ms"
  );
}

#[tokio::test]
async fn test_zero_concurrency_is_rejected_before_dispatch() {
  setup_tracing_for_test();
  let ran = Arc::new(AtomicBool::new(false));

  let mut config = PoolConfig::new(vec![1u32, 2, 3], {
    let ran = ran.clone();
    move |item, _index, _pool| {
      let ran = ran.clone();
      async move {
        ran.store(true, Ordering::SeqCst);
        Ok::<_, PoolError>(item)
      }
    }
  });
  config.concurrency = 0;

  let error = config.run().await.unwrap_err();

  assert!(matches!(error, PoolError::Validation(_)), "got {error:?}");
  assert!(
    !ran.load(Ordering::SeqCst),
    "no task should run after a validation failure"
  );
}

#[tokio::test]
async fn test_lowering_concurrency_applies_to_later_dispatches() {
  setup_tracing_for_test();
  let started_with = Arc::new(parking_lot::Mutex::new(Vec::new()));

  let mut config = PoolConfig::new(vec![1u32, 2, 3, 4, 5], |item, _index, pool| async move {
    if item == 1 {
      pool.set_concurrency(1).expect("ceiling of 1 is valid");
    }
    sleep(Duration::from_millis(100)).await;
    Ok::<_, PoolError>(item)
  });
  config.concurrency = 3;
  config.on_task_started.push(Box::new({
    let started_with = started_with.clone();
    move |item: &u32, pool: &PoolController| {
      started_with.lock().push((*item, pool.active_tasks_count()));
    }
  }));

  let output = config.run().await.unwrap();
  assert!(output.errors.is_empty());

  // The first three items fill the original ceiling before any handler
  // runs; every later dispatch sees the lowered ceiling.
  let observed = started_with.lock().clone();
  assert_eq!(observed, vec![(1, 1), (2, 2), (3, 3), (4, 1), (5, 1)]);
}

#[tokio::test]
async fn test_task_failures_do_not_halt_the_run() {
  setup_tracing_for_test();
  let mut config = PoolConfig::new(vec![1u32, 2, 3, 4, 5], |item, _index, _pool| async move {
    if item % 2 == 0 {
      return Err(PoolError::failed(format!("rejecting {item}")));
    }
    Ok(item * 2)
  });
  config.concurrency = 2;

  let output = config.run().await.unwrap();

  let mut results = output.results.into_collected().unwrap();
  results.sort_unstable();
  assert_eq!(results, vec![2, 6, 10]);

  let mut failed: Vec<u32> = output.errors.iter().map(|failure| failure.item).collect();
  failed.sort_unstable();
  assert_eq!(failed, vec![2, 4]);
  assert_eq!(output.errors[0].message(), format!("rejecting {}", failed[0]));
  assert_eq!(output.processed_items.len(), 5);
}

#[tokio::test]
async fn test_timed_out_handler_keeps_running_without_bookkeeping() {
  setup_tracing_for_test();
  let completions = Arc::new(parking_lot::Mutex::new(Vec::new()));

  let mut config = PoolConfig::new((0u32..5).collect::<Vec<_>>(), {
    let completions = completions.clone();
    move |item, _index, _pool| {
      let completions = completions.clone();
      async move {
        sleep(Duration::from_millis(150)).await;
        completions.lock().push(item);
        Ok::<_, PoolError>(item)
      }
    }
  });
  config.concurrency = 1;
  config.timeout = Some(Duration::from_millis(50));

  let output = config.run().await.unwrap();

  assert_eq!(output.errors.len(), 5);
  assert!(output
    .errors
    .iter()
    .all(|failure| matches!(failure.error, PoolError::Timeout(_))));
  assert_eq!(output.results.len(), 0);

  let completed = completions.lock().clone();
  assert!(
    completed.contains(&0),
    "an early abandoned handler still runs to completion while the run is in progress"
  );
  assert!(
    !completed.contains(&4),
    "the last abandoned handler cannot finish before the run returns"
  );
}

#[tokio::test]
async fn test_empty_items_complete_immediately() {
  setup_tracing_for_test();
  let config = PoolConfig::new(Vec::<u32>::new(), |item, _index, _pool| async move {
    Ok::<_, PoolError>(item)
  });

  let output = config.run().await.unwrap();

  assert!(output.results.is_empty());
  assert!(output.errors.is_empty());
  assert!(output.processed_items.is_empty());
}
