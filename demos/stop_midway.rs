use futures_convoy::PoolConfig;

use std::time::Duration;

use tracing::info;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();

  info!("--- Stop Midway Example ---");

  // Scan readings one at a time and stop the whole run as soon as a
  // poisoned value shows up. Readings after the poisoned one are never
  // dispatched.
  let readings = vec![12u32, 7, 31, 42, 18, 25, 9];
  let total = readings.len();

  let mut config = PoolConfig::new(readings, |reading, index, pool| async move {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if reading == 42 {
      info!("reading {} at position {} is poisoned, stopping the pool", reading, index);
      return Err(pool.stop());
    }
    Ok(reading * reading)
  });
  config.concurrency = 1;

  match config.run().await {
    Ok(output) => {
      info!(
        "processed {} of {} readings before the stop",
        output.processed_items.len(),
        total
      );
      info!("squares collected: {:?}", output.results.as_collected().unwrap_or(&[]));
    }
    Err(error) => tracing::error!("pool run failed: {error}"),
  }

  info!("--- Stop Midway Example End ---");
}
