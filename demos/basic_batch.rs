use futures_convoy::{PoolConfig, PoolController};

use std::time::Duration;

use tracing::info;

async fn fetch_summary(id: u32, delay_ms: u64) -> String {
  tokio::time::sleep(Duration::from_millis(delay_ms)).await;
  format!("record {id} ready after {delay_ms}ms")
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false) // Disable module paths for cleaner example output
    .init();

  info!("--- Basic Batch Example ---");

  let mut config = PoolConfig::new((1u32..=8).collect::<Vec<_>>(), |id, _index, _pool| async move {
    // Alternate delays for variety
    let delay_ms = 100 + u64::from(id % 3) * 150;
    Ok(fetch_summary(id, delay_ms).await)
  });
  config.concurrency = 3;
  config.on_task_finished.push(Box::new(|id: &u32, pool: &PoolController| {
    info!(
      "record {} settled, progress {:.0}%",
      id,
      pool.processed_percentage()
    );
  }));

  match config.run().await {
    Ok(output) => {
      for line in output.results.as_collected().unwrap_or(&[]) {
        info!("{line}");
      }
      info!(
        "{} records processed, {} errors",
        output.processed_items.len(),
        output.errors.len()
      );
    }
    Err(error) => tracing::error!("pool run failed: {error}"),
  }

  info!("--- Basic Batch Example End ---");
}
