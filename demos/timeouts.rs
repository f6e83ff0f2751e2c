use futures_convoy::{PoolConfig, PoolResults, TaskResult};

use std::time::Duration;

use rand::Rng;
use tracing::info;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();

  info!("--- Timeouts Example ---");

  // Every task gets a 100ms budget; roughly half the jittered delays
  // blow through it. Corresponding results keep one slot per item so the
  // timed-out positions stay visible.
  let mut config = PoolConfig::new((1u32..=10).collect::<Vec<_>>(), |id, _index, _pool| async move {
    let delay_ms = rand::rng().random_range(20..200u64);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    Ok(format!("item {id} done in {delay_ms}ms"))
  });
  config.concurrency = 4;
  config.timeout = Some(Duration::from_millis(100));
  config.corresponding_results = true;

  match config.run().await {
    Ok(output) => {
      if let PoolResults::Corresponding(slots) = &output.results {
        for (index, slot) in slots.iter().enumerate() {
          match slot {
            TaskResult::Value(line) => info!("slot {index}: {line}"),
            TaskResult::Failed => info!("slot {index}: timed out"),
            TaskResult::NotRun => info!("slot {index}: never ran"),
          }
        }
      }
      for failure in &output.errors {
        info!("item {} failed: {}", failure.item, failure.message());
      }
    }
    Err(error) => tracing::error!("pool run failed: {error}"),
  }

  info!("--- Timeouts Example End ---");
}
