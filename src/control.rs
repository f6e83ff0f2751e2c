use crate::error::PoolError;

use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Control surface for a running pool, handed to handlers, lifecycle
/// hooks, and the error handler. Cheap to clone; all clones observe and
/// drive the same run.
///
/// Allows reading and changing the concurrency ceiling mid-run, asking the
/// pool to stop dispatching, and observing progress.
#[derive(Debug, Clone)]
pub struct PoolController {
  inner: Arc<ControlState>,
}

#[derive(Debug)]
struct ControlState {
  concurrency: AtomicUsize,
  stop_token: CancellationToken,
  active_tasks: AtomicUsize,
  processed: AtomicUsize,
  item_count: usize,
}

impl PoolController {
  pub(crate) fn new(concurrency: usize, item_count: usize) -> Self {
    Self {
      inner: Arc::new(ControlState {
        concurrency: AtomicUsize::new(concurrency),
        stop_token: CancellationToken::new(),
        active_tasks: AtomicUsize::new(0),
        processed: AtomicUsize::new(0),
        item_count,
      }),
    }
  }

  /// The concurrency ceiling currently in effect.
  pub fn concurrency(&self) -> usize {
    self.inner.concurrency.load(AtomicOrdering::Relaxed)
  }

  /// Changes the concurrency ceiling for subsequent dispatch decisions.
  /// Tasks already in flight are unaffected; the dispatch loop re-reads
  /// the ceiling before every start.
  pub fn set_concurrency(&self, concurrency: usize) -> Result<(), PoolError> {
    if concurrency < 1 {
      return Err(PoolError::Validation(format!(
        "\"concurrency\" must be 1 or up, received {concurrency}"
      )));
    }
    debug!(%concurrency, "pool concurrency ceiling changed");
    self
      .inner
      .concurrency
      .store(concurrency, AtomicOrdering::Relaxed);
    Ok(())
  }

  /// Stops the pool: no further items will be dispatched, tasks already in
  /// flight settle normally. Returns the stop signal for the calling
  /// handler to propagate as its own outcome:
  ///
  /// `return Err(pool.stop());`
  ///
  /// A lifecycle hook, which has no outcome to propagate, may discard the
  /// returned signal; dispatch still halts.
  #[must_use = "propagate the returned signal as the handler outcome"]
  pub fn stop(&self) -> PoolError {
    debug!("pool stop requested");
    self.inner.stop_token.cancel();
    PoolError::Stopped
  }

  /// Whether a stop has been requested.
  pub fn is_stopped(&self) -> bool {
    self.inner.stop_token.is_cancelled()
  }

  /// Number of items in the source collection.
  pub fn items_count(&self) -> usize {
    self.inner.item_count
  }

  /// Number of tasks currently holding a concurrency slot.
  pub fn active_tasks_count(&self) -> usize {
    self.inner.active_tasks.load(AtomicOrdering::Relaxed)
  }

  /// Number of items whose task has settled.
  pub fn processed_count(&self) -> usize {
    self.inner.processed.load(AtomicOrdering::Relaxed)
  }

  /// Percentage of items whose task has settled. An empty run counts as
  /// fully processed.
  pub fn processed_percentage(&self) -> f64 {
    if self.inner.item_count == 0 {
      return 100.0;
    }
    (self.processed_count() as f64 / self.inner.item_count as f64) * 100.0
  }

  pub(crate) fn mark_stopped(&self) {
    self.inner.stop_token.cancel();
  }

  pub(crate) fn task_started(&self) {
    self.inner.active_tasks.fetch_add(1, AtomicOrdering::Relaxed);
  }

  pub(crate) fn task_settled(&self) {
    self.inner.active_tasks.fetch_sub(1, AtomicOrdering::Relaxed);
    self.inner.processed.fetch_add(1, AtomicOrdering::Relaxed);
  }
}
