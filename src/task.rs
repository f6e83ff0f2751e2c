use crate::config::TaskFuture;
use crate::error::PoolError;

use std::time::Duration;

use futures::future::{select, Either};
use tracing::debug;

/// The settled outcome of one dispatched task, reported back to the
/// executor's control flow, which does all bookkeeping.
pub(crate) struct TaskSettlement<T, R> {
  pub(crate) index: usize,
  pub(crate) item: T,
  pub(crate) outcome: Result<R, PoolError>,
  /// A handler future that outlived its timeout. The executor keeps
  /// polling it on the side, without bookkeeping, until the run returns.
  pub(crate) abandoned: Option<TaskFuture<R>>,
}

/// Wraps one handler invocation for the active set, racing it against the
/// configured timeout.
///
/// The race only decides what the pool observes. When the timer wins, the
/// settlement carries a timeout error and hands the still-pending handler
/// future back to the executor instead of dropping it.
pub(crate) async fn wrap<T, R>(
  item: T,
  index: usize,
  future: TaskFuture<R>,
  timeout: Option<Duration>,
) -> TaskSettlement<T, R> {
  match timeout {
    None => {
      let outcome = future.await;
      TaskSettlement {
        index,
        item,
        outcome,
        abandoned: None,
      }
    }
    Some(limit) => {
      let timer = Box::pin(tokio::time::sleep(limit));
      match select(future, timer).await {
        Either::Left((outcome, _timer)) => TaskSettlement {
          index,
          item,
          outcome,
          abandoned: None,
        },
        Either::Right(((), pending)) => {
          debug!(
            %index,
            timeout_ms = limit.as_millis() as u64,
            "task timed out, abandoning its bookkeeping"
          );
          TaskSettlement {
            index,
            item,
            outcome: Err(PoolError::Timeout(limit)),
            abandoned: Some(pending),
          }
        }
      }
    }
  }
}
