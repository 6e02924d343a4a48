use std::sync::Arc;

use log_shipper::init::init_tracing;
use log_shipper::{LogShipper, ShipperConfig};
use tracing::{error, info, warn};

/// Ships logs to a collector at `LOG_SHIPPER_ENDPOINT` (default
/// `http://127.0.0.1:3000`), both directly and through `tracing`.
#[tokio::main]
async fn main() {
    let config = ShipperConfig::from_env().with_batch_threshold(5);
    let shipper = Arc::new(LogShipper::from_config(config).expect("start shipper"));

    init_tracing(Arc::clone(&shipper)).expect("install subscriber");

    shipper.log("INFO", None, "Application started");
    info!(trace_id = "trace-001", "Connecting to database");
    info!(trace_id = "trace-001", "Database connected successfully");
    warn!(trace_id = "trace-002", "High memory usage detected");
    error!(trace_id = "trace-003", "Failed to process request\nStack trace: ...");

    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    info!("Task completed");

    let outcome = shipper.close().await;
    println!("final flush: {:?}, stats: {:?}", outcome, shipper.stats());
}
