//! A Tokio-based pool that runs an async handler over a fixed collection
//! of items with a bounded number of tasks in flight, collecting per-item
//! results and errors, with optional per-task timeouts and cooperative
//! early stop.
//!
//! ```no_run
//! use futures_convoy::{PoolConfig, PoolError};
//!
//! # async fn demo() -> Result<(), PoolError> {
//! let mut config = PoolConfig::new(vec![1u32, 2, 3, 4, 5], |item, _index, _pool| async move {
//!   Ok::<_, PoolError>(item * 2)
//! });
//! config.concurrency = 2;
//!
//! let output = config.run().await?;
//! assert!(output.errors.is_empty());
//! # Ok(())
//! # }
//! ```

mod config;
mod control;
mod error;
mod executor;
mod store;
mod task;

pub use config::{
  ErrorCallback, PoolConfig, ProgressCallback, TaskFuture, TaskHandler, DEFAULT_CONCURRENCY,
};
pub use control::PoolController;
pub use error::PoolError;
pub use executor::PoolExecutor;
pub use store::{PoolOutput, PoolResults, TaskFailure, TaskResult};
