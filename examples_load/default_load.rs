use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};

use log_shipper::noop::NoopTransport;
use log_shipper::{LogShipper, ShipperConfig};

#[tokio::main]
async fn main() {
    let shipper = LogShipper::with_transport(ShipperConfig::default(), Arc::new(NoopTransport))
        .expect("start shipper");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        shipper.log("ERROR", None, &format!("default load test error {i}"));
    }

    let elapsed = start.elapsed();
    println!("default config: logged {} lines in {:?} (~{:.0} lines/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give the coordinator a little time before the final drain
    sleep(Duration::from_millis(200)).await;
    shipper.close().await;
    println!("{:?}", shipper.stats());
}
