use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by a pool run or by individual tasks within it.
///
/// `Stopped` is the cooperative stop signal produced by
/// `PoolController::stop`; the executor recognizes it and swallows it
/// without recording an error. `Validation` is fatal and aborts the run.
/// Everything else is an ordinary task failure that lands in the error
/// list (or the configured error handler) without affecting other tasks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
  /// The pool was asked to stop dispatching further items.
  #[error("pool processing stopped")]
  Stopped,

  /// A task outlived its per-task budget. Carries the configured budget.
  #[error("task in pool timed out after {}ms", .0.as_millis())]
  Timeout(Duration),

  /// The pool was configured or driven with an invalid value.
  #[error("{0}")]
  Validation(String),

  /// A task failed with the given (normalized) message.
  #[error("{0}")]
  Failed(String),
}

impl PoolError {
  /// Normalizes any displayable error into a task failure.
  pub fn failed(error: impl fmt::Display) -> Self {
    PoolError::Failed(error.to_string())
  }
}

impl From<String> for PoolError {
  fn from(message: String) -> Self {
    PoolError::Failed(message)
  }
}

impl From<&str> for PoolError {
  fn from(message: &str) -> Self {
    PoolError::Failed(message.to_string())
  }
}
