use crate::config::{ErrorCallback, PoolConfig, ProgressCallback, TaskFuture, TaskHandler};
use crate::control::PoolController;
use crate::error::PoolError;
use crate::store::{PoolOutput, ResultStore};
use crate::task::{self, TaskSettlement};

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, trace, warn};

type ActiveTask<T, R> = Pin<Box<dyn Future<Output = TaskSettlement<T, R>> + Send>>;

/// Executes one configured run: dispatches items in source order while the
/// number of in-flight tasks stays under the concurrency ceiling, settles
/// tasks as they finish, and drains the stragglers once dispatch ends.
///
/// The executor never spawns: every task future is polled by `run`'s own
/// control flow through the active set, so results, errors, and the
/// processed list are plain owned collections with no locking.
pub struct PoolExecutor<T, R> {
  items: Vec<T>,
  handler: TaskHandler<T, R>,
  error_handler: Option<ErrorCallback<T>>,
  on_task_started: Vec<ProgressCallback<T>>,
  on_task_finished: Vec<ProgressCallback<T>>,
  timeout: Option<Duration>,
  controller: PoolController,
  store: ResultStore<T, R>,
  processed_items: Vec<T>,
  active: FuturesUnordered<ActiveTask<T, R>>,
  orphans: FuturesUnordered<TaskFuture<R>>,
}

impl<T, R> PoolExecutor<T, R>
where
  T: Clone + Send + 'static,
  R: Send + 'static,
{
  pub fn new(config: PoolConfig<T, R>) -> Self {
    let controller = PoolController::new(config.concurrency, config.items.len());
    let store = ResultStore::new(config.corresponding_results, config.items.len());
    Self {
      items: config.items,
      handler: config.handler,
      error_handler: config.error_handler,
      on_task_started: config.on_task_started,
      on_task_finished: config.on_task_finished,
      timeout: config.timeout,
      controller,
      store,
      processed_items: Vec::new(),
      active: FuturesUnordered::new(),
      orphans: FuturesUnordered::new(),
    }
  }

  /// The controller this run hands to handlers and hooks. Clone it before
  /// calling `run` to observe progress, adjust the ceiling, or request a
  /// stop from outside the pool.
  pub fn controller(&self) -> PoolController {
    self.controller.clone()
  }

  /// Runs the pool to completion and returns collected results, errors,
  /// and the processed items.
  ///
  /// Fails only on an invalid configuration, a validation error raised
  /// mid-run, or an error handler that itself returns a non-stop error.
  /// Ordinary task failures are collected and never abort the run.
  pub async fn run(mut self) -> Result<PoolOutput<T, R>, PoolError> {
    self.validate()?;
    info!(
      items = self.items.len(),
      concurrency = self.controller.concurrency(),
      timeout = ?self.timeout,
      corresponding = self.is_corresponding(),
      "starting pool run"
    );

    let items = std::mem::take(&mut self.items);
    for (index, item) in items.into_iter().enumerate() {
      if self.controller.is_stopped() {
        debug!(%index, "pool stopped, halting dispatch");
        break;
      }
      self.wait_for_slot().await?;
      // A task that settled during the wait may have stopped the pool;
      // the stop flag is checked immediately before every start.
      if self.controller.is_stopped() {
        debug!(%index, "pool stopped while waiting for a slot, halting dispatch");
        break;
      }
      self.dispatch(item, index);
    }

    self.drain().await?;
    info!(processed = self.processed_items.len(), "pool run complete");
    Ok(self.store.into_output(self.processed_items))
  }

  fn validate(&self) -> Result<(), PoolError> {
    let concurrency = self.controller.concurrency();
    if concurrency < 1 {
      warn!(%concurrency, "rejecting pool run with invalid concurrency");
      return Err(PoolError::Validation(format!(
        "\"concurrency\" must be 1 or up, received {concurrency}"
      )));
    }
    Ok(())
  }

  fn dispatch(&mut self, item: T, index: usize) {
    trace!(%index, "dispatching task");
    let future = (self.handler)(item.clone(), index, self.controller.clone());
    self.controller.task_started();
    for callback in &self.on_task_started {
      callback(&item, &self.controller);
    }
    self
      .active
      .push(Box::pin(task::wrap(item, index, future, self.timeout)));
  }

  /// Blocks dispatch until the active set is below the ceiling. The
  /// ceiling is re-read on every pass because handlers and hooks may
  /// change it mid-run; the wait is realized by settling the
  /// earliest-finishing active task, never by a fixed delay.
  async fn wait_for_slot(&mut self) -> Result<(), PoolError> {
    while self.active.len() >= self.controller.concurrency() {
      self.settle_next().await?;
    }
    Ok(())
  }

  /// Settles the earliest-finishing active task, driving abandoned
  /// timed-out handlers on the side while waiting.
  async fn settle_next(&mut self) -> Result<(), PoolError> {
    let settled = loop {
      if self.orphans.is_empty() {
        break self.active.next().await;
      }
      tokio::select! {
        biased;
        settled = self.active.next() => break settled,
        _ = self.orphans.next() => {
          trace!("abandoned task finished, discarding its outcome");
        }
      }
    };
    match settled {
      Some(settlement) => self.settle(settlement),
      None => Ok(()),
    }
  }

  /// All per-task bookkeeping happens here, exactly once per task: the
  /// active set already dropped the wrapper, the outcome is routed, the
  /// item is recorded as processed, and the finished hooks fire whatever
  /// the outcome was.
  fn settle(&mut self, settlement: TaskSettlement<T, R>) -> Result<(), PoolError> {
    let TaskSettlement {
      index,
      item,
      outcome,
      abandoned,
    } = settlement;
    if let Some(pending) = abandoned {
      self.orphans.push(pending);
    }
    self.controller.task_settled();

    let routed = match outcome {
      Ok(value) => {
        trace!(%index, "task completed");
        self.store.save(index, value);
        Ok(())
      }
      Err(error) => self.route_error(error, &item, index),
    };

    for callback in &self.on_task_finished {
      callback(&item, &self.controller);
    }
    self.processed_items.push(item);
    routed
  }

  /// Classifies a task error. The stop signal is swallowed without
  /// touching the result slot; a validation error stops the pool and
  /// aborts the run; everything else marks the slot failed and goes to the
  /// error handler or the error list.
  fn route_error(&mut self, error: PoolError, item: &T, index: usize) -> Result<(), PoolError> {
    match error {
      PoolError::Stopped => {
        // Handlers normally obtain the signal from stop(), but returning
        // it directly must stop the pool as well.
        debug!(%index, "task raised the stop signal");
        self.controller.mark_stopped();
        Ok(())
      }
      PoolError::Validation(message) => {
        warn!(%index, %message, "validation error during run, stopping the pool");
        self.controller.mark_stopped();
        Err(PoolError::Validation(message))
      }
      error => {
        self.store.mark_failed(index);
        match &self.error_handler {
          Some(handler) => match handler(error, item, &self.controller) {
            Ok(()) => Ok(()),
            Err(PoolError::Stopped) => {
              debug!(%index, "error handler raised the stop signal");
              self.controller.mark_stopped();
              Ok(())
            }
            Err(rethrown) => {
              warn!(%index, error = %rethrown, "error handler failed, aborting the run");
              Err(rethrown)
            }
          },
          None => {
            debug!(%index, %error, "recording task error");
            self.store.record_error(error, item.clone());
            Ok(())
          }
        }
      }
    }
  }

  /// Awaits every still-active task after dispatch has ended. Abandoned
  /// timed-out handlers do not hold the drain open; whatever is still
  /// pending when the last active task settles is dropped with the
  /// executor.
  async fn drain(&mut self) -> Result<(), PoolError> {
    if !self.active.is_empty() {
      debug!(remaining = self.active.len(), "draining active tasks");
    }
    while !self.active.is_empty() {
      self.settle_next().await?;
    }
    Ok(())
  }

  fn is_corresponding(&self) -> bool {
    self.store.is_corresponding()
  }
}
