use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

use log_shipper::noop::NoopTransport;
use log_shipper::{LogShipper, ShipperConfig};

#[tokio::main]
async fn main() {
    let config = ShipperConfig::new("http://127.0.0.1:3000", "custom-load")
        .with_batch_threshold(1_000)
        .with_flush_interval(Duration::from_millis(200))
        .with_capacity(50_000);

    let shipper = LogShipper::with_transport(config, Arc::new(NoopTransport))
        .expect("start shipper");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        shipper.log("ERROR", Some("load-trace"), &format!("custom load test error {i}"));
    }

    let elapsed = start.elapsed();
    println!("custom config: logged {} lines in {:?} (~{:.0} lines/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    shipper.close().await;
    println!("{:?}", shipper.stats());
}
