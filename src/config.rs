use crate::control::PoolController;
use crate::error::PoolError;
use crate::executor::PoolExecutor;
use crate::store::PoolOutput;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Number of tasks processed concurrently when no ceiling is configured.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// The future a handler produces for one item.
pub type TaskFuture<R> = Pin<Box<dyn Future<Output = Result<R, PoolError>> + Send + 'static>>;

/// The unit of work applied to each item, called with
/// `(item, index, controller)`.
pub type TaskHandler<T, R> = Box<dyn Fn(T, usize, PoolController) -> TaskFuture<R> + Send + Sync>;

/// Routes a task error instead of the error list, called with
/// `(error, item, controller)`. Returning `Err` with the stop signal halts
/// dispatch; any other `Err` aborts the whole run.
pub type ErrorCallback<T> =
  Box<dyn Fn(PoolError, &T, &PoolController) -> Result<(), PoolError> + Send + Sync>;

/// Lifecycle observer, called with `(item, controller)` when a task is
/// dispatched or when it settles.
pub type ProgressCallback<T> = Box<dyn Fn(&T, &PoolController) + Send + Sync>;

/// Everything one pool run needs, assembled up front.
///
/// `items` and `handler` are required and set through [`PoolConfig::new`];
/// the remaining options are plain fields with the usual defaults
/// (concurrency 10, no timeout, collected results, no error handler, no
/// hooks) and can be overwritten before the run:
///
/// ```no_run
/// use std::time::Duration;
/// use futures_convoy::{PoolConfig, PoolError};
///
/// # async fn demo() -> Result<(), PoolError> {
/// let mut config = PoolConfig::new(vec![1u32, 2, 3], |item, _index, _pool| async move {
///   Ok::<_, PoolError>(item * 2)
/// });
/// config.concurrency = 2;
/// config.timeout = Some(Duration::from_secs(5));
/// let output = config.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct PoolConfig<T, R> {
  /// Work items, dispatched in this order.
  pub items: Vec<T>,
  /// Maximum number of simultaneously active tasks. Must be 1 or up.
  pub concurrency: usize,
  /// Per-task wall-clock budget. `None` disables timeout racing.
  ///
  /// A task that exceeds the budget settles as a timeout error and frees
  /// its slot. The handler itself is not interrupted: it keeps running in
  /// the background until the run returns, and its eventual outcome is
  /// discarded.
  pub timeout: Option<Duration>,
  /// When set, results keep the position of their source item, with
  /// marker slots for items that failed or never ran. Otherwise results
  /// are collected in completion order.
  pub corresponding_results: bool,
  /// The unit of work applied to each item.
  pub handler: TaskHandler<T, R>,
  /// When set, task errors are routed here instead of the error list.
  pub error_handler: Option<ErrorCallback<T>>,
  /// Observers invoked synchronously right after a task is dispatched.
  pub on_task_started: Vec<ProgressCallback<T>>,
  /// Observers invoked after a task settles, whatever the outcome.
  pub on_task_finished: Vec<ProgressCallback<T>>,
}

impl<T, R> PoolConfig<T, R>
where
  T: Clone + Send + 'static,
  R: Send + 'static,
{
  /// A configuration for running `handler` over `items` with default
  /// options.
  pub fn new<F, Fut>(items: Vec<T>, handler: F) -> Self
  where
    F: Fn(T, usize, PoolController) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, PoolError>> + Send + 'static,
  {
    Self {
      items,
      concurrency: DEFAULT_CONCURRENCY,
      timeout: None,
      corresponding_results: false,
      handler: Box::new(move |item, index, pool| {
        Box::pin(handler(item, index, pool)) as TaskFuture<R>
      }),
      error_handler: None,
      on_task_started: Vec::new(),
      on_task_finished: Vec::new(),
    }
  }

  /// Runs the pool to completion. Shorthand for
  /// `PoolExecutor::new(self).run()`.
  pub async fn run(self) -> Result<PoolOutput<T, R>, PoolError> {
    PoolExecutor::new(self).run().await
  }
}

impl<T, R> fmt::Debug for PoolConfig<T, R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PoolConfig")
      .field("items", &self.items.len())
      .field("concurrency", &self.concurrency)
      .field("timeout", &self.timeout)
      .field("corresponding_results", &self.corresponding_results)
      .field("error_handler", &self.error_handler.is_some())
      .field("on_task_started", &self.on_task_started.len())
      .field("on_task_finished", &self.on_task_finished.len())
      .finish_non_exhaustive()
  }
}
